// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.

use crate::player::binder::SCRUBBER_MAX;
use crate::player::events::{EventKind, Role};
use crate::player::session::Player;

/// Display the scrubber across the available width.
pub fn show(ui: &mut egui::Ui, player: &Player) {
    ui.horizontal(|ui| {
        ui.label(format!("{:>8.2} s", player.current_time()));

        let mut raw = player.controls().scrubber.raw;
        ui.spacing_mut().slider_width = (ui.available_width() - 16.0).max(100.0);
        let response = ui.add_enabled(
            player.duration().is_finite(),
            egui::Slider::new(&mut raw, 0.0..=SCRUBBER_MAX).show_value(false),
        );

        // Holding the handle counts as focus: updates must not yank it away.
        let active = response.has_focus() || response.dragged();
        let was_active = player.controls().scrubber.focused;
        if active && !was_active {
            player.dispatch(Role::ControlScrubber, EventKind::Focus);
        }

        if response.changed() {
            player.controls_mut().scrubber.raw = raw;
            player.dispatch(Role::ControlScrubber, EventKind::Input);
        }
        if response.drag_stopped() {
            player.dispatch(Role::ControlScrubber, EventKind::Change);
        }

        if !active && was_active {
            player.dispatch(Role::ControlScrubber, EventKind::Blur);
        }
    });
}
