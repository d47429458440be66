// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotator - video annotation player
//!
//! A desktop player that overlays a drawing surface on a video so regions
//! ("things") can be marked over time and stored on an annotation server.

mod app;
mod config;
mod io;
mod models;
mod player;
mod ui;
mod util;

use anyhow::Result;
use app::AnnotatorApp;
use clap::Parser;
use config::Config;

fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter())).init();

    config.validate()?;
    log::info!(
        "Annotating {} as '{}' via {}",
        config.video.display(),
        config.name,
        config.server
    );

    let app = AnnotatorApp::new(&config)?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title(format!("Annotator - {}", config.name)),
        ..Default::default()
    };

    // Run the application
    eframe::run_native("Annotator", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
