// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one load. Only the most recently issued token of a
/// [`Sessions`] counter is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Monotonic load counter for one panel.
///
/// Starting a load takes a new token; when the load completes the caller
/// checks [`Sessions::is_current`] and drops the result of a superseded load.
#[derive(Debug, Clone, Default)]
pub struct Sessions {
    latest: Arc<AtomicU64>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> SessionToken {
        SessionToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Supersedes every outstanding load without starting a new one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
