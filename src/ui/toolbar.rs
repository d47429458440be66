// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar: transport buttons, the time field, and save.
//!
//! Widgets only forward user input to the player as role events. All state
//! changes happen in the player's handlers.

use crate::player::events::{EventKind, Role};
use crate::player::session::Player;

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    Save,
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, player: &Player, saving: bool, status: (&str, bool)) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.add(egui::Button::new("▶ Play")).clicked() {
            player.dispatch(Role::ControlPlay, EventKind::Click);
        }
        if ui.add(egui::Button::new("⏸ Pause")).clicked() {
            player.dispatch(Role::ControlPause, EventKind::Click);
        }

        ui.separator();

        time_field(ui, player);
        let duration = player.duration();
        if duration.is_finite() {
            ui.label(format!("/ {:.2} s", duration));
        }

        ui.separator();

        let can_save = !saving && player.annotations_loaded().is_settled();
        if ui
            .add_enabled(can_save, egui::Button::new("💾 Save"))
            .on_hover_text("Store annotations on the server (Ctrl+S)")
            .clicked()
        {
            action = ToolbarAction::Save;
        }

        let (message, is_error) = status;
        let text = egui::RichText::new(message).italics();
        if is_error {
            ui.label(text.color(egui::Color32::LIGHT_RED));
        } else {
            ui.label(text.weak());
        }
    });

    action
}

/// Numeric seconds field. Edits are committed as a change event when the
/// field loses focus (Enter also drops focus).
fn time_field(ui: &mut egui::Ui, player: &Player) {
    let mut text = player.controls().time.text.clone();
    let response = ui.add(
        egui::TextEdit::singleline(&mut text)
            .id_source(Role::ControlTime.class_name())
            .desired_width(72.0),
    );

    if response.changed() {
        player.controls_mut().time.text = text;
    }
    if response.gained_focus() {
        player.dispatch(Role::ControlTime, EventKind::Focus);
    }
    if response.lost_focus() {
        player.dispatch(Role::ControlTime, EventKind::Change);
        player.dispatch(Role::ControlTime, EventKind::Blur);
    }
}
