// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use serde_json::json;

use super::{CommandContext, OutputFormat};

pub enum CacheCommand {
    Clear,
    Info { format: OutputFormat },
}

impl CacheCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let cache = context.api.cache();

        match self {
            Self::Clear => {
                eprintln!("Clearing cache at {}...", cache.dir().display());
                if let Err(e) = cache.clear().await {
                    eprintln!("Warning: Failed to clear cache: {}", e);
                } else {
                    println!("Cache cleared");
                }
            }
            Self::Info { format } => {
                let stats = cache.stats()?;
                let ttl = context.config.cache.ttl();
                let output = json!({
                    "dir": cache.dir(),
                    "entries": stats.entries,
                    "bytes": stats.bytes,
                    "ttl_seconds": ttl.as_secs(),
                });
                format.emit(&output, |_| {
                    println!("Directory: {}", cache.dir().display());
                    println!("Entries:   {}", stats.entries);
                    println!(
                        "Size:      {}",
                        moviecat::format::bytes_to(Some(&json!(stats.bytes)))
                    );
                    println!("TTL:       {}s", ttl.as_secs());
                })?;
            }
        }

        Ok(())
    }
}
