// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Context;

use crate::domain::config::LoggingConfig;

/// Install the global tracing subscriber for the embedding process.
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}
