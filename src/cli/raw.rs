// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};

use super::CommandContext;

/// Print an endpoint's JSON as returned, bypassing the cache.
pub struct RawCommand {
    pub path: String,
}

impl RawCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let path = if self.path.starts_with('/') {
            self.path
        } else {
            format!("/{}", self.path)
        };
        eprintln!("GET {}", context.api.url_for(&path));

        let result = context
            .api
            .request_raw(&path)
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}
