// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video display with the annotation paper on top.
//!
//! Pressing on empty paper creates a new thing that follows the pointer
//! until release; pressing on an existing thing moves it. Geometry edits
//! are keyed to the current video time.

use crate::player::events::Role;
use crate::player::session::Player;
use crate::util::geometry::{fit_to_area, paper_to_screen, screen_to_paper, DisplayRect};

/// Display the canvas area and handle pointer interaction.
pub fn show(ui: &mut egui::Ui, player: &Player, texture: &Option<egui::TextureHandle>, status: &str) {
    // Set background color
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        // The paper borrow must end before pointer handlers redraw it.
        let paper_size = player.paper().as_ref().map(|p| p.size());
        let Some(paper_size) = paper_size else {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new(status).color(egui::Color32::WHITE));
            });
            return;
        };

        let available = ui.available_size();
        let fit = fit_to_area(paper_size.0, paper_size.1, available.x as f64, available.y as f64);
        let origin = ui.min_rect().min;
        let display = DisplayRect {
            x: origin.x as f64 + fit.x,
            y: origin.y as f64 + fit.y,
            ..fit
        };
        let frame_rect = egui::Rect::from_min_size(
            egui::pos2(display.x as f32, display.y as f32),
            egui::vec2(display.width as f32, display.height as f32),
        );

        match texture {
            Some(texture) => {
                ui.painter().image(
                    texture.id(),
                    frame_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                ui.painter().rect_filled(frame_rect, 0.0, egui::Color32::BLACK);
            }
        }

        let response = ui.interact(
            frame_rect,
            egui::Id::new(Role::Paper.class_name()),
            egui::Sense::drag(),
        );
        let to_paper = |pos: egui::Pos2| screen_to_paper(pos.x as f64, pos.y as f64, &display, paper_size);

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = to_paper(pos);
                player.begin_drag(x, y);
            }
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = to_paper(pos);
                player.drag_to(x, y);
            }
        }
        if response.drag_stopped() {
            player.end_drag();
        }

        let paper = player.paper();
        if let Some(paper) = paper.as_ref() {
            let painter = ui.painter_at(frame_rect);
            for shape in paper.shapes() {
                let color = if shape.active {
                    egui::Color32::LIGHT_BLUE
                } else {
                    egui::Color32::YELLOW
                };
                let (x0, y0) = paper_to_screen(shape.bounds.x_min, shape.bounds.y_min, &display, paper_size);
                let (x1, y1) = paper_to_screen(shape.bounds.x_max, shape.bounds.y_max, &display, paper_size);
                let rect = egui::Rect::from_min_max(
                    egui::pos2(x0 as f32, y0 as f32),
                    egui::pos2(x1 as f32, y1 as f32),
                );

                painter.rect_stroke(rect, 0.0, egui::Stroke::new(2.0, color));
                painter.text(
                    rect.left_top() + egui::vec2(2.0, -2.0),
                    egui::Align2::LEFT_BOTTOM,
                    &shape.label,
                    egui::FontId::proportional(12.0),
                    color,
                );
            }
        }
    });

    // Display counts at the bottom
    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Things: {}", player.store().len()));
        ui.separator();
        ui.label(status);
    });
}
