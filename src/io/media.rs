// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media sources (images and videos).
//!
//! `MediaElement` behaves like an HTML video element: it probes the source
//! in the background, reports `LoadedMetadata` (or `Abort`) once the
//! intrinsic size and duration are known, and keeps the playback position
//! on a wall clock while playing. Events are queued and handed out by
//! `poll_events`, never delivered from inside a setter.

use crate::player::events::EventKind;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Minimum spacing of time updates during playback.
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Media file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported media: {0}")]
    Unsupported(String),

    #[error("Failed to probe media: {0}")]
    Probe(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),
}

/// Intrinsic properties known once metadata has loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    /// Seconds; zero for still images.
    pub duration: f64,
}

/// A decoded RGBA frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// The playback resource the player binds to.
pub trait VideoResource {
    /// Canonical playback position in seconds.
    fn current_time(&self) -> f64;

    /// Seek. Out-of-range values are clamped by the resource.
    fn set_current_time(&mut self, seconds: f64);

    /// Duration in seconds, NaN before metadata has loaded.
    fn duration(&self) -> f64;

    /// Intrinsic video size, once known.
    fn intrinsic_size(&self) -> Option<(u32, u32)>;

    fn play(&mut self);

    fn pause(&mut self);

    fn paused(&self) -> bool;

    /// Advance the resource to `now` and return the events it emitted.
    fn poll_events(&mut self, now: Instant) -> Vec<EventKind>;

    /// The frame for the current position, if it changed since last call.
    fn take_frame(&mut self) -> Option<VideoFrame> {
        None
    }
}

/// Decodes frames for a probed source.
trait FrameSource: Send {
    /// Frame shown at `seconds`.
    fn frame_index(&self, seconds: f64) -> u64;

    fn decode(&mut self, index: u64) -> Result<VideoFrame, MediaError>;
}

/// A still image is a single frame of zero duration.
struct StillFrame {
    frame: VideoFrame,
}

impl FrameSource for StillFrame {
    fn frame_index(&self, _seconds: f64) -> u64 {
        0
    }

    fn decode(&mut self, _index: u64) -> Result<VideoFrame, MediaError> {
        Ok(self.frame.clone())
    }
}

type ProbeResult = Result<(MediaMetadata, Box<dyn FrameSource>), MediaError>;

/// Inspect `path` and open a frame source for it.
fn probe(path: &Path) -> ProbeResult {
    if !path.exists() {
        return Err(MediaError::NotFound(path.to_path_buf()));
    }

    if image::ImageFormat::from_path(path).is_err() {
        return probe_video(path);
    }

    let rgba = image::open(path)
        .map_err(|e| MediaError::Probe(e.to_string()))?
        .to_rgba8();
    let metadata = MediaMetadata {
        width: rgba.width(),
        height: rgba.height(),
        duration: 0.0,
    };
    let frame = VideoFrame {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    };
    Ok((metadata, Box::new(StillFrame { frame })))
}

#[cfg(not(feature = "video-opencv"))]
fn probe_video(path: &Path) -> ProbeResult {
    Err(MediaError::Unsupported(format!(
        "{} (video decoding requires the video-opencv feature)",
        path.display()
    )))
}

#[cfg(feature = "video-opencv")]
fn probe_video(path: &Path) -> ProbeResult {
    let (metadata, frames) = opencv_source::open(path)?;
    Ok((metadata, Box::new(frames)))
}

#[cfg(feature = "video-opencv")]
mod opencv_source {
    use super::{FrameSource, MediaError, MediaMetadata, VideoFrame};
    use opencv::{core::Mat, imgproc, prelude::*, videoio};
    use std::path::Path;

    fn probe_error(e: opencv::Error) -> MediaError {
        MediaError::Probe(e.to_string())
    }

    fn decode_error(e: opencv::Error) -> MediaError {
        MediaError::Decode(e.to_string())
    }

    pub struct CaptureFrames {
        capture: videoio::VideoCapture,
        fps: f64,
        frame_count: u64,
        /// Index the capture will read next without seeking.
        next_index: u64,
    }

    pub fn open(path: &Path) -> Result<(MediaMetadata, CaptureFrames), MediaError> {
        let capture = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
            .map_err(probe_error)?;
        if !capture.is_opened().map_err(probe_error)? {
            return Err(MediaError::Probe(format!("cannot open {}", path.display())));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).map_err(probe_error)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).map_err(probe_error)? as u32;
        let fps = capture.get(videoio::CAP_PROP_FPS).map_err(probe_error)?;
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT).map_err(probe_error)?;
        if width == 0 || height == 0 || fps <= 0.0 {
            return Err(MediaError::Probe(format!("no video stream in {}", path.display())));
        }

        let metadata = MediaMetadata {
            width,
            height,
            duration: frame_count / fps,
        };
        Ok((
            metadata,
            CaptureFrames {
                capture,
                fps,
                frame_count: frame_count.max(1.0) as u64,
                next_index: 0,
            },
        ))
    }

    impl FrameSource for CaptureFrames {
        fn frame_index(&self, seconds: f64) -> u64 {
            let index = (seconds * self.fps).floor().max(0.0) as u64;
            index.min(self.frame_count - 1)
        }

        fn decode(&mut self, index: u64) -> Result<VideoFrame, MediaError> {
            if index != self.next_index {
                self.capture
                    .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
                    .map_err(decode_error)?;
            }

            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr).map_err(decode_error)? {
                return Err(MediaError::Decode(format!("no frame at index {}", index)));
            }
            self.next_index = index + 1;

            let mut rgba = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0).map_err(decode_error)?;
            let size = rgba.size().map_err(decode_error)?;
            Ok(VideoFrame {
                width: size.width as u32,
                height: size.height as u32,
                pixels: rgba.data_bytes().map_err(decode_error)?.to_vec(),
            })
        }
    }
}

/// Clock-driven video resource backed by a background probe.
pub struct MediaElement {
    source: PathBuf,
    probe: Option<Receiver<ProbeResult>>,
    metadata: Option<MediaMetadata>,
    frames: Option<Box<dyn FrameSource>>,
    shown_frame: Option<u64>,
    position: f64,
    /// Wall-clock anchor and position at that anchor while playing.
    playing_since: Option<(Instant, f64)>,
    last_time_update: Option<Instant>,
    events: VecDeque<EventKind>,
}

impl MediaElement {
    /// Start loading `source`. Metadata arrives through `poll_events`.
    pub fn open(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let (sender, receiver) = channel();
        let path = source.clone();

        // Spawn background thread for probing
        std::thread::spawn(move || {
            let _ = sender.send(probe(&path));
        });

        Self {
            source,
            probe: Some(receiver),
            metadata: None,
            frames: None,
            shown_frame: None,
            position: 0.0,
            playing_since: None,
            last_time_update: None,
            events: VecDeque::new(),
        }
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let seconds = seconds.max(0.0);
        match self.metadata {
            Some(m) => seconds.min(m.duration),
            None => seconds,
        }
    }

    fn poll_probe(&mut self) {
        let Some(receiver) = &self.probe else {
            return;
        };

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(MediaError::Probe("probe thread exited".to_string()))
            }
        };
        self.probe = None;

        match result {
            Ok((metadata, frames)) => {
                log::info!(
                    "Loaded media metadata: {} ({}x{}, {:.2}s)",
                    self.source.display(),
                    metadata.width,
                    metadata.height,
                    metadata.duration
                );
                self.metadata = Some(metadata);
                self.frames = Some(frames);
                self.position = self.clamp(self.position);
                self.events.push_back(EventKind::LoadedMetadata);
            }
            Err(e) => {
                log::error!("Failed to load media {}: {}", self.source.display(), e);
                self.events.push_back(EventKind::Abort);
            }
        }
    }

    fn advance_clock(&mut self, now: Instant) {
        let (Some((anchor, start)), Some(metadata)) = (self.playing_since, self.metadata) else {
            return;
        };

        let elapsed = now.saturating_duration_since(anchor).as_secs_f64();
        let position = start + elapsed;
        if position >= metadata.duration {
            self.position = metadata.duration;
            self.playing_since = None;
            self.last_time_update = Some(now);
            self.events.extend([EventKind::TimeUpdate, EventKind::Pause, EventKind::Ended]);
            return;
        }

        self.position = position;
        let due = self
            .last_time_update
            .map_or(true, |last| now.saturating_duration_since(last) >= TIME_UPDATE_INTERVAL);
        if due {
            self.last_time_update = Some(now);
            self.events.push_back(EventKind::TimeUpdate);
        }
    }
}

impl VideoResource for MediaElement {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            log::warn!("Ignoring seek to {}", seconds);
            return;
        }
        self.position = self.clamp(seconds);
        if self.playing_since.is_some() {
            self.playing_since = Some((Instant::now(), self.position));
        }
        self.events.push_back(EventKind::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.metadata.map_or(f64::NAN, |m| m.duration)
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        self.metadata.map(|m| (m.width, m.height))
    }

    fn play(&mut self) {
        let Some(metadata) = self.metadata else {
            log::debug!("play() before metadata, ignored");
            return;
        };
        if self.playing_since.is_some() || metadata.duration <= 0.0 {
            return;
        }
        if self.position >= metadata.duration {
            self.position = 0.0;
        }
        self.playing_since = Some((Instant::now(), self.position));
        self.events.push_back(EventKind::Play);
    }

    fn pause(&mut self) {
        if self.playing_since.is_some() {
            self.advance_clock(Instant::now());
            // advance_clock may already have paused at the end.
            if self.playing_since.take().is_some() {
                self.events.push_back(EventKind::Pause);
            }
        }
    }

    fn paused(&self) -> bool {
        self.playing_since.is_none()
    }

    fn poll_events(&mut self, now: Instant) -> Vec<EventKind> {
        self.poll_probe();
        self.advance_clock(now);
        self.events.drain(..).collect()
    }

    fn take_frame(&mut self) -> Option<VideoFrame> {
        let frames = self.frames.as_mut()?;
        let index = frames.frame_index(self.position);
        if self.shown_frame == Some(index) {
            return None;
        }
        self.shown_frame = Some(index);

        match frames.decode(index) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}
