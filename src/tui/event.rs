// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
}

/// Terminal input plus a steady tick, merged into one channel.
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(tick_rate_ms));
            loop {
                // Polling blocks, so it stays off the async workers
                let polled = tokio::task::spawn_blocking(|| {
                    if event::poll(Duration::from_millis(20)).unwrap_or(false) {
                        event::read().ok()
                    } else {
                        None
                    }
                })
                .await
                .ok()
                .flatten();

                let event = match polled {
                    Some(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(Event::Key(key))
                    }
                    Some(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                    Some(CrosstermEvent::Resize(width, height)) => {
                        Some(Event::Resize(width, height))
                    }
                    _ => None,
                };

                if let Some(event) = event
                    && sender.send(event).is_err()
                {
                    break;
                }

                interval.tick().await;
                if sender.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { receiver }
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Event channel closed"))
    }
}
