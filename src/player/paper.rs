// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Retained drawing surface laid over the video.
//!
//! The paper has the video's intrinsic size and keeps an ordered display
//! list. Things draw into it; the canvas paints the list every frame.
//! Later shapes are painted over earlier ones.

use crate::models::thing::Bounds;

/// One rectangle on the paper.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub thing_id: u64,
    pub bounds: Bounds,
    pub label: String,
    /// Currently being dragged.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    width: u32,
    height: u32,
    shapes: Vec<Shape>,
}

impl Paper {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn rect(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}
