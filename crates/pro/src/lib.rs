// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rsave-pro: PRO account authorization and feature entitlements for
//! Remotely Save.

pub mod command;
pub mod config;
pub mod credential;
pub mod error;
#[cfg(test)]
pub mod test_support;

use std::io::Write;

use crate::config::Config;

/// Run the configured subcommand, printing results to stdout.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let mut out = Vec::new();
    command::run(&config, &mut out).await?;
    std::io::stdout().write_all(&out)?;
    Ok(())
}
