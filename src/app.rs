// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the event loop and the player. Every frame it pumps the
//! player (video events, finished requests, queued continuations), uploads
//! a new video frame if there is one, and lays out the panels.

use crate::config::Config;
use crate::io::api::HttpAnnotationApi;
use crate::io::media::MediaElement;
use crate::io::serialization;
use crate::player::event_loop::EventLoop;
use crate::player::events::{EventKind, Role};
use crate::player::session::Player;
use crate::ui::{canvas, timeline, toolbar};
use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Message shown in the toolbar and status line.
#[derive(Debug, Clone)]
struct Status {
    message: String,
    is_error: bool,
}

impl Status {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Main application state.
pub struct AnnotatorApp {
    event_loop: EventLoop,
    player: Player,

    /// Latest video frame for display
    texture: Option<egui::TextureHandle>,

    /// Updated from signal continuations
    status: Rc<RefCell<Status>>,

    /// A save request is in flight
    saving: Rc<Cell<bool>>,
}

impl AnnotatorApp {
    /// Open the video and start loading its annotations.
    pub fn new(config: &Config) -> Result<Self> {
        let api = HttpAnnotationApi::new(&config.server, config.timeout())?;
        let event_loop = EventLoop::new();
        let video = MediaElement::open(&config.video);
        let player = Player::new(Box::new(video), config.name.clone(), Arc::new(api), &event_loop);

        let status = Rc::new(RefCell::new(Status::info("Loading video and annotations...")));
        {
            let status = status.clone();
            player.loaded().then(move |outcome| {
                *status.borrow_mut() = match outcome {
                    Ok(_) => Status::info("Ready"),
                    Err(e) => Status::error(e.to_string()),
                };
            });
        }

        Ok(Self {
            event_loop,
            player,
            texture: None,
            status,
            saving: Rc::new(Cell::new(false)),
        })
    }

    /// Store annotations on the server and report the outcome.
    fn save_annotations(&self) {
        if self.saving.replace(true) {
            return;
        }
        *self.status.borrow_mut() = Status::info("Saving...");

        let status = self.status.clone();
        let saving = self.saving.clone();
        self.player.save().then(move |outcome| {
            saving.set(false);
            *status.borrow_mut() = match outcome {
                Ok(message) => Status::info(message),
                Err(e) => Status::error(format!("Save failed: {}", e)),
            };
        });
    }

    /// Export annotations to a local file.
    fn export_annotations(&self, path: std::path::PathBuf) {
        let result = self
            .player
            .export_records()
            .map_err(anyhow::Error::from)
            .and_then(|records| serialization::export(&records, &path));

        match result {
            Ok(()) => log::info!("Exported annotations to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export annotations: {}", e);
                *self.status.borrow_mut() = Status::error(format!("Export failed: {}", e));
            }
        }
    }

    /// Replace the annotations with the contents of a local file.
    fn import_annotations(&self, path: std::path::PathBuf) {
        let result = serialization::import(&path).and_then(|records| {
            self.player
                .import_records(&records)
                .map_err(anyhow::Error::from)
        });

        *self.status.borrow_mut() = match result {
            Ok(count) => {
                log::info!("Imported {} annotations from {}", count, path.display());
                Status::info(format!("Imported {} annotations (not yet saved)", count))
            }
            Err(e) => {
                log::error!("Failed to import annotations: {}", e);
                Status::error(format!("Import failed: {}", e))
            }
        };
    }

    fn toggle_playback(&self) {
        if self.player.paused() {
            self.player.dispatch(Role::ControlPlay, EventKind::Click);
        } else {
            self.player.dispatch(Role::ControlPause, EventKind::Click);
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.player.take_frame() else {
            return;
        };

        let size = [frame.width as usize, frame.height as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR));
            }
        }
    }
}

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.player.pump(Instant::now());
        self.upload_frame(ctx);

        // Keep frames coming while playing or while anything is in flight.
        if !self.player.paused() {
            ctx.request_repaint();
        } else if !self.event_loop.is_idle() || !self.player.loaded().is_settled() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        // Handle keyboard events
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_playback();
        }
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) {
            self.save_annotations();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Save Annotations (Ctrl+S)").clicked() {
                        self.save_annotations();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Export Annotations...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .add_filter("YAML", &["yaml", "yml"])
                            .set_file_name(format!("{}.json", self.player.name()))
                            .save_file()
                        {
                            self.export_annotations(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Import Annotations...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Annotations", &["json", "yaml", "yml"])
                            .pick_file()
                        {
                            self.import_annotations(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        let status = self.status.borrow().clone();

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(ui, &self.player, self.saving.get(), (&status.message, status.is_error))
            })
            .inner;
        if let toolbar::ToolbarAction::Save = toolbar_action {
            self.save_annotations();
        }

        // Scrubber (bottom)
        egui::TopBottomPanel::bottom("timeline").show(ctx, |ui| {
            timeline::show(ui, &self.player);
        });

        // Main canvas (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            canvas::show(ui, &self.player, &self.texture, &status.message);
        });
    }
}
