// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! The paper uses the video's intrinsic pixel coordinates while the canvas
//! shows it scaled to fit the window. These helpers convert between the two.

/// Where the paper is shown on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fit a `width` x `height` frame into the available area, keeping the
/// aspect ratio and centering it.
pub fn fit_to_area(width: u32, height: u32, available_width: f64, available_height: f64) -> DisplayRect {
    if width == 0 || height == 0 {
        return DisplayRect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let frame_aspect = width as f64 / height as f64;
    let available_aspect = available_width / available_height;

    let (display_width, display_height) = if frame_aspect > available_aspect {
        // Frame is wider - fit to width
        (available_width, available_width / frame_aspect)
    } else {
        // Frame is taller - fit to height
        (available_height * frame_aspect, available_height)
    };

    DisplayRect {
        x: (available_width - display_width) / 2.0,
        y: (available_height - display_height) / 2.0,
        width: display_width,
        height: display_height,
    }
}

/// Convert a screen point to paper coordinates.
pub fn screen_to_paper(screen_x: f64, screen_y: f64, rect: &DisplayRect, paper: (u32, u32)) -> (f64, f64) {
    (
        (screen_x - rect.x) / rect.width * paper.0 as f64,
        (screen_y - rect.y) / rect.height * paper.1 as f64,
    )
}

/// Convert paper coordinates to a screen point.
pub fn paper_to_screen(paper_x: f64, paper_y: f64, rect: &DisplayRect, paper: (u32, u32)) -> (f64, f64) {
    (
        rect.x + paper_x / paper.0 as f64 * rect.width,
        rect.y + paper_y / paper.1 as f64 * rect.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_paper_roundtrip() {
        let rect = fit_to_area(1920, 1080, 800.0, 600.0);
        let (px, py) = screen_to_paper(400.0, 300.0, &rect, (1920, 1080));
        let (sx, sy) = paper_to_screen(px, py, &rect, (1920, 1080));

        assert!((px - 960.0).abs() < 0.0001);
        assert!((py - 540.0).abs() < 0.0001);
        assert!((sx - 400.0).abs() < 0.0001);
        assert!((sy - 300.0).abs() < 0.0001);
    }

    #[test]
    fn test_fit_wide_frame_letterboxes() {
        let rect = fit_to_area(1920, 1080, 800.0, 600.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.width, 800.0);
        assert_eq!(rect.height, 450.0);
        assert_eq!(rect.y, 75.0);

        // Top-left corner
        let tl = screen_to_paper(0.0, 75.0, &rect, (1920, 1080));
        assert_eq!(tl, (0.0, 0.0));
    }

    #[test]
    fn test_fit_tall_frame_pillarboxes() {
        let rect = fit_to_area(480, 640, 800.0, 600.0);
        assert_eq!(rect.height, 600.0);
        assert_eq!(rect.width, 450.0);
        assert_eq!(rect.x, 175.0);
    }
}
