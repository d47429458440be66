// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The ordered sequence of things owned by a player session.
//!
//! Sequence order is draw order: later things are painted over earlier
//! ones and win hit tests.

use super::thing::{Bounds, Thing};
use crate::player::paper::Paper;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct AnnotationStore {
    things: Vec<Thing>,
    next_id: u64,
    /// Set once a load attempt has finished, successfully or not.
    populated: bool,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode stored records in order. Fails on the first bad record.
    pub fn decode(records: &[Value]) -> serde_json::Result<Vec<Thing>> {
        records.iter().map(Thing::from_json).collect()
    }

    /// Serialize every thing, in order.
    pub fn to_json(&self) -> serde_json::Result<Vec<Value>> {
        self.things.iter().map(Thing::to_json).collect()
    }

    /// Replace the whole sequence with freshly loaded things.
    pub fn replace(&mut self, things: Vec<Thing>) {
        self.next_id = things.iter().map(|t| t.id + 1).max().unwrap_or(0);
        self.things = things;
        self.populated = true;
    }

    /// Settle the store empty after a failed load.
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn things(&self) -> &[Thing] {
        &self.things
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    /// Redraw every thing at `time`, in sequence order.
    pub fn draw_at_time(&mut self, time: f64, paper: &mut Paper) {
        paper.clear();
        for thing in &mut self.things {
            thing.draw_at_time(time, paper);
        }
    }

    /// Append a zero-size thing at (x, y) and start resizing it right away.
    pub fn create_at(&mut self, x: f64, y: f64, time: f64) -> &Thing {
        let id = self.next_id;
        self.next_id += 1;

        let mut thing = Thing::new(id, format!("thing {}", id + 1));
        let bounds = Bounds::at_point(x, y);
        thing.set_keyframe(time, bounds);
        thing.drawing.set_bounds(bounds);
        thing.drawing.on_drag_start();

        log::info!("Created thing {} at ({:.1}, {:.1}), total: {}", id, x, y, self.things.len() + 1);
        self.things.push(thing);
        &self.things[self.things.len() - 1]
    }

    /// Index of the topmost thing under (x, y) at `time`.
    pub fn hit_test(&self, x: f64, y: f64, time: f64) -> Option<usize> {
        self.things.iter().rposition(|t| t.contains(x, y, time))
    }

    /// Start moving the thing at `index`, grabbed at (x, y) at `time`.
    pub fn start_move(&mut self, index: usize, x: f64, y: f64, time: f64) {
        if let Some(thing) = self.things.get_mut(index) {
            thing.drawing.bounds = thing.bounds_at(time);
            thing.drawing.start_move(x, y);
        }
    }

    /// The thing currently being dragged, if any.
    pub fn dragging(&self) -> Option<&Thing> {
        self.things.iter().find(|t| t.drawing.is_dragging())
    }

    /// Forward a pointer move to the dragged thing.
    pub fn drag_to(&mut self, x: f64, y: f64, time: f64) -> bool {
        self.things
            .iter_mut()
            .find(|t| t.drawing.is_dragging())
            .is_some_and(|t| t.drag_to(x, y, time))
    }

    /// Release every drag. Returns whether one was active.
    pub fn end_drag(&mut self) -> bool {
        let mut ended = false;
        for thing in &mut self.things {
            ended |= thing.drawing.on_drag_end();
        }
        ended
    }
}
