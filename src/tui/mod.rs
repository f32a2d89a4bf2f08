// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod app;
pub mod event;
pub mod ui;
pub mod widgets;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;

use crate::api::MovieApi;
use crate::config::Config;
use crate::player::Player;

pub use app::App;
pub use event::{Event, EventHandler};

const TICK_RATE_MS: u64 = 50;

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    pub event_handler: EventHandler,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(TICK_RATE_MS);
        Ok(Self {
            terminal,
            event_handler,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        install_panic_hook();
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::draw(frame, app))?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// Leave raw mode before a panic message is printed, or it is unreadable.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        previous(info);
    }));
}

/// Run the interactive UI until the user quits. Any mpv window the UI
/// started is closed on the way out.
pub async fn run_tui(config: Config, api: MovieApi, player: Player) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.init()?;

    let mut app = App::new(config, api, player);
    let res = run_app(&mut tui, &mut app).await;
    app.shutdown().await;
    tui.exit()?;

    if let Err(err) = res {
        tracing::error!("TUI stopped: {:#}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    tui.draw(app)?;

    loop {
        let should_redraw = match tui.event_handler.next().await? {
            Event::Key(key_event) => match app.handle_key_event(key_event).await {
                Some(app::Action::Quit) => break,
                None => true,
            },
            Event::Resize(_, _) => true,
            Event::Mouse(_) => false,
            Event::Tick => {
                // The debounce fires from here, so searches start between keys
                app.tick();
                app.async_tick().await
            }
        };

        if should_redraw {
            tui.draw(app)?;
        }
    }

    Ok(())
}
