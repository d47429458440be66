// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Role-keyed event subscriptions.
//!
//! Every widget of the player is addressed by a role (`player-video`,
//! `player-control-time`, ...). Handlers subscribe to a role and one or
//! more event kinds; the UI layer and the video resource push events in
//! with `dispatch`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Named sub-element of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Video,
    Paper,
    ControlPlay,
    ControlPause,
    ControlTime,
    ControlScrubber,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Video,
        Role::Paper,
        Role::ControlPlay,
        Role::ControlPause,
        Role::ControlTime,
        Role::ControlScrubber,
    ];

    /// Role suffix, e.g. `control-time`.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Video => "video",
            Role::Paper => "paper",
            Role::ControlPlay => "control-play",
            Role::ControlPause => "control-pause",
            Role::ControlTime => "control-time",
            Role::ControlScrubber => "control-scrubber",
        }
    }

    /// Element id used for the widget, e.g. `player-control-time`.
    pub fn class_name(self) -> String {
        format!("player-{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kinds delivered to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Change,
    Input,
    Focus,
    Blur,
    LoadedMetadata,
    Abort,
    TimeUpdate,
    Play,
    Pause,
    Ended,
}

pub type Handler = Rc<dyn Fn(EventKind)>;

/// Subscription table. Cloning shares the table.
#[derive(Clone, Default)]
pub struct EventTable {
    handlers: Rc<RefCell<HashMap<(Role, EventKind), Vec<Handler>>>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to each of `kinds` on `role`.
    pub fn on(&self, role: Role, kinds: &[EventKind], handler: impl Fn(EventKind) + 'static) {
        let handler: Handler = Rc::new(handler);
        let mut handlers = self.handlers.borrow_mut();
        for kind in kinds {
            handlers
                .entry((role, *kind))
                .or_default()
                .push(handler.clone());
        }
    }

    /// Run the handlers of `(role, kind)` in subscription order.
    /// Returns how many ran.
    pub fn dispatch(&self, role: Role, kind: EventKind) -> usize {
        // Handlers may subscribe or dispatch again, so run them on a snapshot.
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&(role, kind))
            .cloned()
            .unwrap_or_default();

        if kind != EventKind::TimeUpdate {
            log::debug!("{} {:?} -> {} handler(s)", role.class_name(), kind, snapshot.len());
        }
        for handler in &snapshot {
            handler(kind);
        }
        snapshot.len()
    }

    pub fn handler_count(&self, role: Role, kind: EventKind) -> usize {
        self.handlers
            .borrow()
            .get(&(role, kind))
            .map_or(0, Vec::len)
    }
}
