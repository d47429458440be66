// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Time-varying annotation regions.
//!
//! A `Thing` is a rectangle whose bounds are keyed by video time. Between
//! two keyframes the bounds are linearly interpolated; before the first and
//! after the last keyframe the nearest keyframe holds. Coordinates are in
//! paper pixels, i.e. the video's intrinsic resolution.

use crate::player::paper::{Paper, Shape};
use serde::{Deserialize, Serialize};

/// Two keyframes closer than this are the same keyframe.
const TIME_EPSILON: f64 = 1e-6;

/// Axis-aligned rectangle in paper coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Zero-size bounds at a point.
    pub fn at_point(x: f64, y: f64) -> Self {
        Self {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        }
    }

    /// The rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x_min: a.0.min(b.0),
            x_max: a.0.max(b.0),
            y_min: a.1.min(b.1),
            y_max: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x_min: self.x_min + dx,
            x_max: self.x_max + dx,
            y_min: self.y_min + dy,
            y_max: self.y_max + dy,
        }
    }

    /// Linear interpolation, `f` in [0, 1].
    pub fn lerp(&self, other: &Bounds, f: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * f;
        Self {
            x_min: mix(self.x_min, other.x_min),
            x_max: mix(self.x_max, other.x_max),
            y_min: mix(self.y_min, other.y_min),
            y_max: mix(self.y_max, other.y_max),
        }
    }
}

/// Bounds of a thing at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub bounds: Bounds,
}

/// What the pointer is currently doing to a drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragMode {
    #[default]
    Idle,
    /// Stretching from a fixed corner.
    Resizing { anchor: (f64, f64) },
    /// Moving the whole rectangle; `grab` is the pointer position at start.
    Moving { grab: (f64, f64), origin: Bounds },
}

/// Interactive state of the on-screen rectangle. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    pub bounds: Option<Bounds>,
    pub mode: DragMode,
}

impl Drawing {
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
    }

    /// Begin resizing from the current top-left corner, as if the pointer
    /// had just been pressed there.
    pub fn on_drag_start(&mut self) {
        if let Some(bounds) = self.bounds {
            self.mode = DragMode::Resizing {
                anchor: (bounds.x_min, bounds.y_min),
            };
        }
    }

    pub fn start_move(&mut self, x: f64, y: f64) {
        if let Some(origin) = self.bounds {
            self.mode = DragMode::Moving {
                grab: (x, y),
                origin,
            };
        }
    }

    /// Follow the pointer. Returns the new bounds while a drag is active.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<Bounds> {
        let bounds = match self.mode {
            DragMode::Idle => return None,
            DragMode::Resizing { anchor } => Bounds::from_corners(anchor, (x, y)),
            DragMode::Moving { grab, origin } => origin.translate(x - grab.0, y - grab.1),
        };
        self.bounds = Some(bounds);
        Some(bounds)
    }

    /// Leave drag mode. Returns whether a drag was active.
    pub fn on_drag_end(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.mode = DragMode::Idle;
        was_dragging
    }

    pub fn is_dragging(&self) -> bool {
        self.mode != DragMode::Idle
    }
}

/// A user-created, time-varying annotation region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    pub id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    /// Record fields this client does not interpret, kept for the round trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    pub drawing: Drawing,
}

/// Persisted fields only; the drawing state is transient.
impl PartialEq for Thing {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.label == other.label
            && self.keyframes == other.keyframes
            && self.extra == other.extra
    }
}

impl Thing {
    pub fn new(id: u64, label: String) -> Self {
        Self {
            id,
            label,
            keyframes: Vec::new(),
            extra: serde_json::Map::new(),
            drawing: Drawing::default(),
        }
    }

    /// Decode one stored annotation record. Keyframes are put in time order.
    pub fn from_json(json: &serde_json::Value) -> serde_json::Result<Self> {
        let mut thing = Thing::deserialize(json)?;
        thing
            .keyframes
            .sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(thing)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Insert a keyframe at `time`, replacing one already there.
    pub fn set_keyframe(&mut self, time: f64, bounds: Bounds) {
        match self
            .keyframes
            .iter()
            .position(|k| k.time >= time - TIME_EPSILON)
        {
            Some(i) if (self.keyframes[i].time - time).abs() < TIME_EPSILON => {
                self.keyframes[i].bounds = bounds;
            }
            Some(i) => self.keyframes.insert(i, Keyframe { time, bounds }),
            None => self.keyframes.push(Keyframe { time, bounds }),
        }
    }

    /// Interpolated bounds at `time`, or `None` without keyframes.
    pub fn bounds_at(&self, time: f64) -> Option<Bounds> {
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.bounds);
        }

        for pair in self.keyframes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if time <= b.time {
                let span = b.time - a.time;
                if span <= TIME_EPSILON {
                    return Some(b.bounds);
                }
                return Some(a.bounds.lerp(&b.bounds, (time - a.time) / span));
            }
        }

        self.keyframes.last().map(|k| k.bounds)
    }

    /// Render the geometry as it exists at `time` onto the paper.
    ///
    /// While a drag is in progress the pointer owns the bounds, so the
    /// keyframes are not consulted.
    pub fn draw_at_time(&mut self, time: f64, paper: &mut Paper) {
        if !self.drawing.is_dragging() {
            self.drawing.bounds = self.bounds_at(time);
        }

        if let Some(bounds) = self.drawing.bounds {
            paper.rect(Shape {
                thing_id: self.id,
                bounds,
                label: self.label.clone(),
                active: self.drawing.is_dragging(),
            });
        }
    }

    /// Follow the pointer and record the result as the keyframe at `time`.
    pub fn drag_to(&mut self, x: f64, y: f64, time: f64) -> bool {
        match self.drawing.drag_to(x, y) {
            Some(bounds) => {
                self.set_keyframe(time, bounds);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, x: f64, y: f64, time: f64) -> bool {
        self.bounds_at(time).is_some_and(|b| b.contains(x, y))
    }
}
