// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback binder.
//!
//! The video resource owns the canonical playback time. The numeric time
//! field and the scrubber are projections of it, refreshed on every time
//! update. A control with input focus is the authoritative one while the
//! user edits it and is skipped by the refresh. User edits seek the video
//! directly; the other control catches up on the next time update.

use super::events::{EventKind, EventTable, Role};
use crate::io::media::VideoResource;
use std::cell::RefCell;
use std::rc::Rc;

/// Scrubber positions run from 0 to this value across the duration.
pub const SCRUBBER_MAX: f64 = 10_000.0;

/// Convert a scrubber position to seconds. The position is clamped to the
/// scrubber range. `None` for a zero, negative, or unknown duration.
pub fn scrubber_to_seconds(raw: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    let seconds = raw.clamp(0.0, SCRUBBER_MAX) / SCRUBBER_MAX * duration;
    seconds.is_finite().then_some(seconds)
}

/// Convert seconds to a scrubber position, clamped to the scrubber range.
/// `None` for a zero, negative, or unknown duration.
pub fn seconds_to_scrubber(seconds: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    let raw = seconds * SCRUBBER_MAX / duration;
    raw.is_finite().then(|| raw.clamp(0.0, SCRUBBER_MAX))
}

/// Numeric seconds field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeField {
    pub text: String,
    pub focused: bool,
}

impl TimeField {
    /// Parsed seconds; `None` for unparsable or non-finite input.
    pub fn value(&self) -> Option<f64> {
        self.text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Show `seconds` unless the user is editing the field.
    pub fn set_unfocused(&mut self, seconds: f64) {
        if !self.focused {
            self.text = format!("{:.2}", seconds);
        }
    }
}

/// Slider over `0..=SCRUBBER_MAX`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scrubber {
    pub raw: f64,
    pub focused: bool,
}

impl Scrubber {
    pub fn value(&self, duration: f64) -> Option<f64> {
        scrubber_to_seconds(self.raw, duration)
    }

    pub fn set_unfocused(&mut self, seconds: f64, duration: f64) {
        if self.focused {
            return;
        }
        if let Some(raw) = seconds_to_scrubber(seconds, duration) {
            self.raw = raw;
        }
    }
}

/// The editable views of the playback time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub time: TimeField,
    pub scrubber: Scrubber,
}

impl Controls {
    /// Refresh every unfocused control from the canonical time.
    pub fn refresh(&mut self, seconds: f64, duration: f64) {
        self.time.set_unfocused(seconds);
        self.scrubber.set_unfocused(seconds, duration);
    }

    /// Record focus changes reported by the UI.
    pub fn set_focus(&mut self, role: Role, focused: bool) {
        match role {
            Role::ControlTime => self.time.focused = focused,
            Role::ControlScrubber => self.scrubber.focused = focused,
            _ => {}
        }
    }
}

pub type SharedVideo = Rc<RefCell<Box<dyn VideoResource>>>;

/// Wire the transport and time controls to the video through `events`.
/// `on_time` runs after the controls have been refreshed on each time
/// update.
pub fn install(
    events: &EventTable,
    video: &SharedVideo,
    controls: &Rc<RefCell<Controls>>,
    on_time: impl Fn(f64) + 'static,
) {
    // control-play => video, control-pause => video
    {
        let video = video.clone();
        events.on(Role::ControlPlay, &[EventKind::Click], move |_| {
            video.borrow_mut().play();
        });
    }
    {
        let video = video.clone();
        events.on(Role::ControlPause, &[EventKind::Click], move |_| {
            video.borrow_mut().pause();
        });
    }

    // Focus tracking for both editable controls.
    for role in [Role::ControlTime, Role::ControlScrubber] {
        let controls = controls.clone();
        events.on(role, &[EventKind::Focus, EventKind::Blur], move |kind| {
            controls.borrow_mut().set_focus(role, kind == EventKind::Focus);
        });
    }

    // control-time => video
    {
        let video = video.clone();
        let controls = controls.clone();
        events.on(Role::ControlTime, &[EventKind::Change], move |_| {
            let value = controls.borrow().time.value();
            match value {
                Some(seconds) => video.borrow_mut().set_current_time(seconds),
                None => log::warn!(
                    "Ignoring time field value {:?}",
                    controls.borrow().time.text
                ),
            }
        });
    }

    // control-scrubber => video
    {
        let video = video.clone();
        let controls = controls.clone();
        events.on(
            Role::ControlScrubber,
            &[EventKind::Change, EventKind::Input],
            move |_| {
                let duration = video.borrow().duration();
                let value = controls.borrow().scrubber.value(duration);
                if let Some(seconds) = value {
                    video.borrow_mut().set_current_time(seconds);
                }
            },
        );
    }

    // video => controls, video => annotations
    {
        let video = video.clone();
        let controls = controls.clone();
        events.on(Role::Video, &[EventKind::TimeUpdate], move |_| {
            let (seconds, duration) = {
                let video = video.borrow();
                (video.current_time(), video.duration())
            };
            controls.borrow_mut().refresh(seconds, duration);
            on_time(seconds);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::FakeVideo;
    use proptest::prelude::*;
    use std::cell::Cell;

    struct Fixture {
        events: EventTable,
        video: SharedVideo,
        fake: Rc<RefCell<FakeVideo>>,
        controls: Rc<RefCell<Controls>>,
        redraws: Rc<RefCell<Vec<f64>>>,
    }

    fn fixture(duration: f64) -> Fixture {
        let (fake, video) = FakeVideo::shared(duration, (640, 480));
        let events = EventTable::new();
        let controls = Rc::new(RefCell::new(Controls::default()));
        let redraws = Rc::new(RefCell::new(Vec::new()));
        let sink = redraws.clone();
        install(&events, &video, &controls, move |t| sink.borrow_mut().push(t));
        Fixture {
            events,
            video,
            fake,
            controls,
            redraws,
        }
    }

    #[test]
    fn test_scrubber_conversions() {
        assert_eq!(scrubber_to_seconds(5000.0, 100.0), Some(50.0));
        assert_eq!(seconds_to_scrubber(25.0, 100.0), Some(2500.0));
    }

    #[test]
    fn test_conversions_guard_unknown_duration() {
        assert_eq!(scrubber_to_seconds(5000.0, f64::NAN), None);
        assert_eq!(scrubber_to_seconds(5000.0, f64::INFINITY), None);
        assert_eq!(scrubber_to_seconds(5000.0, 0.0), None);
        assert_eq!(scrubber_to_seconds(f64::NAN, 100.0), None);
        assert_eq!(seconds_to_scrubber(5.0, 0.0), None);
        assert_eq!(seconds_to_scrubber(5.0, f64::NAN), None);
    }

    #[test]
    fn test_scrubber_position_is_clamped() {
        assert_eq!(scrubber_to_seconds(-50.0, 100.0), Some(0.0));
        assert_eq!(scrubber_to_seconds(12_000.0, 100.0), Some(100.0));
    }

    #[test]
    fn test_time_field_rejects_non_finite_text() {
        for text in ["", "abc", "NaN", "inf", "-infinity"] {
            let field = TimeField {
                text: text.to_string(),
                focused: false,
            };
            assert_eq!(field.value(), None, "{:?}", text);
        }
        let field = TimeField {
            text: " 12.5 ".to_string(),
            focused: false,
        };
        assert_eq!(field.value(), Some(12.5));
    }

    #[test]
    fn test_timeupdate_skips_focused_time_field() {
        let f = fixture(100.0);
        f.controls.borrow_mut().time.text = "7".to_string();
        f.events.dispatch(Role::ControlTime, EventKind::Focus);

        f.fake.borrow_mut().time = 25.0;
        f.events.dispatch(Role::Video, EventKind::TimeUpdate);

        let controls = f.controls.borrow();
        assert_eq!(controls.time.text, "7");
        assert_eq!(controls.scrubber.raw, 2500.0);
        assert_eq!(*f.redraws.borrow(), vec![25.0]);
    }

    #[test]
    fn test_timeupdate_skips_focused_scrubber() {
        let f = fixture(100.0);
        f.controls.borrow_mut().scrubber.raw = 9000.0;
        f.events.dispatch(Role::ControlScrubber, EventKind::Focus);

        f.fake.borrow_mut().time = 10.0;
        f.events.dispatch(Role::Video, EventKind::TimeUpdate);
        assert_eq!(f.controls.borrow().scrubber.raw, 9000.0);
        assert_eq!(f.controls.borrow().time.text, "10.00");

        f.events.dispatch(Role::ControlScrubber, EventKind::Blur);
        f.events.dispatch(Role::Video, EventKind::TimeUpdate);
        assert_eq!(f.controls.borrow().scrubber.raw, 1000.0);
    }

    #[test]
    fn test_time_field_change_seeks_without_touching_scrubber() {
        let f = fixture(100.0);
        f.controls.borrow_mut().time.text = "42".to_string();
        f.events.dispatch(Role::ControlTime, EventKind::Change);

        assert_eq!(f.video.borrow().current_time(), 42.0);
        // The scrubber follows on the next tick only.
        assert_eq!(f.controls.borrow().scrubber.raw, 0.0);
        f.events.dispatch(Role::Video, EventKind::TimeUpdate);
        assert_eq!(f.controls.borrow().scrubber.raw, 4200.0);
    }

    #[test]
    fn test_invalid_time_field_does_not_seek() {
        let f = fixture(100.0);
        f.fake.borrow_mut().time = 3.0;
        f.controls.borrow_mut().time.text = "later".to_string();
        f.events.dispatch(Role::ControlTime, EventKind::Change);
        assert_eq!(f.video.borrow().current_time(), 3.0);
    }

    #[test]
    fn test_scrubber_input_seeks() {
        let f = fixture(100.0);
        f.controls.borrow_mut().scrubber.raw = 5000.0;
        f.events.dispatch(Role::ControlScrubber, EventKind::Input);
        assert_eq!(f.video.borrow().current_time(), 50.0);
    }

    #[test]
    fn test_scrubber_before_metadata_does_not_seek() {
        let f = fixture(f64::NAN);
        f.controls.borrow_mut().scrubber.raw = 5000.0;
        f.events.dispatch(Role::ControlScrubber, EventKind::Change);
        assert_eq!(f.video.borrow().current_time(), 0.0);
    }

    #[test]
    fn test_transport_buttons_drive_video() {
        let f = fixture(100.0);
        let before = Rc::new(Cell::new(0));
        let count = before.clone();
        f.events.on(Role::Video, &[EventKind::Play], move |_| count.set(count.get() + 1));

        f.events.dispatch(Role::ControlPlay, EventKind::Click);
        assert!(!f.video.borrow().paused());
        f.events.dispatch(Role::ControlPause, EventKind::Click);
        assert!(f.video.borrow().paused());
        // Play events only come from the video itself.
        assert_eq!(before.get(), 0);
    }

    proptest! {
        #[test]
        fn prop_scrubber_roundtrip_within_range(
            duration in 0.1f64..100_000.0,
            fraction in 0.0f64..=1.0,
        ) {
            let seconds = duration * fraction;
            let raw = seconds_to_scrubber(seconds, duration).unwrap();
            prop_assert!((0.0..=SCRUBBER_MAX).contains(&raw));
            let back = scrubber_to_seconds(raw, duration).unwrap();
            prop_assert!((back - seconds).abs() <= duration * 1e-9);
        }
    }
}
