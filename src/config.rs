// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Command line configuration.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Annotate time-varying regions on a video.
#[derive(Debug, Clone, Parser)]
#[command(name = "annotator", version, about)]
pub struct Config {
    /// Video (or still image) to annotate
    pub video: PathBuf,

    /// Session name; annotations live at /annotation/<NAME>
    #[arg(short, long, env = "ANNOTATOR_NAME")]
    pub name: String,

    /// Base URL of the annotation server
    #[arg(short, long, env = "ANNOTATOR_SERVER", default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Reject settings that would produce a broken resource URL.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Session name must not be empty");
        }
        if self.name.contains('/') {
            bail!("Session name must not contain '/': {}", self.name);
        }
        if !(self.server.starts_with("http://") || self.server.starts_with("https://")) {
            bail!("Server URL must start with http:// or https://: {}", self.server);
        }
        if self.timeout_secs == 0 {
            bail!("Timeout must be at least one second");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default log filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
