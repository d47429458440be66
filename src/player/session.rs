// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Player session.
//!
//! A `Player` pairs one video resource with one paper and the ordered list
//! of things annotated on it. Three resources load independently:
//!
//! - `video_loaded` resolves when the video's intrinsic size and duration
//!   are known (the paper is created at that point) and rejects on abort.
//! - `annotations_loaded` resolves once the stored annotations have been
//!   fetched, decoded, and drawn for the first time. Drawing needs the
//!   paper, so it also waits on `video_loaded`.
//! - `loaded` is the conjunction of both.
//!
//! Nothing is drawn before the paper exists and the thing list has been
//! populated.

use super::binder::{self, Controls, SharedVideo};
use super::event_loop::{EventLoop, WorkerLost};
use super::events::{EventKind, EventTable, Role};
use super::paper::Paper;
use super::signal::{join, LoadSignal};
use crate::io::api::{AnnotationApi, ApiError};
use crate::io::media::{VideoFrame, VideoResource};
use crate::models::store::AnnotationStore;
use serde_json::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Message a successful save resolves with.
pub const SAVE_OK_MESSAGE: &str = "State saved successfully.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("Video loading was aborted")]
    VideoAborted,

    #[error("Failed to load annotations: {0}")]
    Fetch(ApiError),

    #[error("Invalid annotation record: {0}")]
    Decode(String),

    #[error("Cannot draw annotations: {0}")]
    Draw(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    #[error("{0}")]
    Api(ApiError),

    #[error("Failed to serialize annotations: {0}")]
    Encode(String),

    #[error("Annotations have not finished loading")]
    NotLoaded,
}

pub type ReadySignal = LoadSignal<(), LoadError>;
pub type SaveSignal = LoadSignal<String, SaveError>;

struct Inner {
    name: String,
    event_loop: EventLoop,
    events: EventTable,
    api: Arc<dyn AnnotationApi>,
    video: SharedVideo,
    controls: Rc<RefCell<Controls>>,
    paper: RefCell<Option<Paper>>,
    store: RefCell<AnnotationStore>,
    video_loaded: ReadySignal,
    annotations_loaded: ReadySignal,
    loaded: LoadSignal<((), ()), LoadError>,
}

impl Inner {
    fn current_time(&self) -> f64 {
        self.video.borrow().current_time()
    }

    fn init_paper(&self) {
        let size = self.video.borrow().intrinsic_size();
        match size {
            Some((width, height)) => {
                *self.paper.borrow_mut() = Some(Paper::new(width, height));
                self.video_loaded.resolve(());
            }
            None => {
                log::error!("Metadata loaded without an intrinsic size");
                self.video_loaded.reject(LoadError::VideoAborted);
            }
        }
    }

    /// Draw every thing at the current video time.
    fn draw(&self) -> Result<(), LoadError> {
        let time = self.current_time();
        let mut paper = self.paper.borrow_mut();
        let paper = paper.as_mut().ok_or(LoadError::Draw("video size unknown"))?;
        let mut store = self.store.borrow_mut();
        if !store.is_populated() {
            return Err(LoadError::Draw("annotations not loaded"));
        }
        store.draw_at_time(time, paper);
        Ok(())
    }

    /// Handle the fetch result of `Player::load`.
    fn finish_load(
        self: &Rc<Self>,
        result: Result<Result<Vec<Value>, ApiError>, WorkerLost>,
        done: ReadySignal,
    ) {
        let records = match result {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => return self.fail_load(done, LoadError::Fetch(e)),
            Err(WorkerLost) => return self.fail_load(done, LoadError::Fetch(ApiError::WorkerLost)),
        };

        match AnnotationStore::decode(&records) {
            Ok(things) => {
                log::info!("Loaded {} annotations for {}", things.len(), self.name);
                self.store.borrow_mut().replace(things);
            }
            Err(e) => return self.fail_load(done, LoadError::Decode(e.to_string())),
        }

        // The first draw needs the paper, which only exists once the video
        // metadata is in.
        let weak = Rc::downgrade(self);
        self.video_loaded.then(move |video| {
            let outcome = video.and_then(|()| match weak.upgrade() {
                Some(inner) => inner.draw(),
                None => Err(LoadError::Draw("player dropped")),
            });
            done.settle(outcome);
        });
    }

    fn fail_load(&self, done: ReadySignal, error: LoadError) {
        log::warn!("Annotation load for {} failed: {}", self.name, error);
        self.store.borrow_mut().clear();
        done.reject(error);
    }
}

/// One annotated video.
pub struct Player {
    inner: Rc<Inner>,
}

impl Player {
    /// Bind `video` and start loading the annotations stored under `name`.
    pub fn new(
        video: Box<dyn VideoResource>,
        name: impl Into<String>,
        api: Arc<dyn AnnotationApi>,
        event_loop: &EventLoop,
    ) -> Self {
        let video_loaded = ReadySignal::new("videoLoaded", event_loop);
        let annotations_loaded = ReadySignal::new("annotationsLoaded", event_loop);
        let loaded = join("loaded", &video_loaded, &annotations_loaded);

        let inner = Rc::new(Inner {
            name: name.into(),
            event_loop: event_loop.clone(),
            events: EventTable::new(),
            api,
            video: Rc::new(RefCell::new(video)),
            controls: Rc::new(RefCell::new(Controls::default())),
            paper: RefCell::new(None),
            store: RefCell::new(AnnotationStore::new()),
            video_loaded,
            annotations_loaded,
            loaded,
        });

        let player = Self { inner };
        player.install_handlers();
        player.load().forward_to(&player.inner.annotations_loaded);
        player
    }

    fn install_handlers(&self) {
        let inner = &self.inner;
        let weak: Weak<Inner> = Rc::downgrade(inner);

        binder::install(&inner.events, &inner.video, &inner.controls, {
            let weak = weak.clone();
            move |time| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = inner.draw() {
                        log::trace!("Skipping redraw at {:.2}s: {}", time, e);
                    }
                }
            }
        });

        {
            let weak = weak.clone();
            inner.events.on(Role::Video, &[EventKind::LoadedMetadata], move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.init_paper();
                }
            });
        }

        inner.events.on(Role::Video, &[EventKind::Abort], move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.video_loaded.reject(LoadError::VideoAborted);
            }
        });
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn video_loaded(&self) -> &ReadySignal {
        &self.inner.video_loaded
    }

    pub fn annotations_loaded(&self) -> &ReadySignal {
        &self.inner.annotations_loaded
    }

    /// Resolves once both the video and the annotations have loaded.
    pub fn loaded(&self) -> &LoadSignal<((), ()), LoadError> {
        &self.inner.loaded
    }

    /// Fetch the stored annotations and replace the thing list with them.
    ///
    /// The returned signal resolves after the first draw, which waits for
    /// the video metadata. On failure the thing list is left empty.
    pub fn load(&self) -> ReadySignal {
        let inner = &self.inner;
        let done = ReadySignal::new("annotation load", &inner.event_loop);
        let api = inner.api.clone();
        let name = inner.name.clone();
        let weak = Rc::downgrade(inner);
        let signal = done.clone();

        inner.event_loop.spawn_blocking(
            move || api.fetch(&name),
            move |result| {
                if let Some(inner) = weak.upgrade() {
                    inner.finish_load(result, done);
                }
            },
        );
        signal
    }

    /// Store the thing list remotely. Resolves with a status message;
    /// the in-memory list is never changed.
    pub fn save(&self) -> SaveSignal {
        let inner = &self.inner;
        let done = SaveSignal::new("annotation save", &inner.event_loop);

        // Saving an unpopulated list would replace the stored document with `[]`.
        if !inner.store.borrow().is_populated() {
            done.reject(SaveError::NotLoaded);
            return done;
        }

        let records = match inner.store.borrow().to_json() {
            Ok(records) => records,
            Err(e) => {
                done.reject(SaveError::Encode(e.to_string()));
                return done;
            }
        };

        let api = inner.api.clone();
        let name = inner.name.clone();
        let signal = done.clone();
        inner.event_loop.spawn_blocking(
            move || {
                let count = records.len();
                api.store(&name, &records).map(|()| (name, count))
            },
            move |result| match result {
                Ok(Ok((name, count))) => {
                    log::info!("Saved {} annotations for {}", count, name);
                    done.resolve(SAVE_OK_MESSAGE.to_string());
                }
                Ok(Err(e)) => {
                    log::warn!("Saving annotations failed: {}", e);
                    done.reject(SaveError::Api(e));
                }
                Err(WorkerLost) => {
                    done.reject(SaveError::Api(ApiError::WorkerLost));
                }
            },
        );
        signal
    }

    /// Redraw every thing at the current time. Returns `false` while the
    /// paper or the thing list is not ready yet.
    pub fn draw_annotations(&self) -> bool {
        self.inner.draw().is_ok()
    }

    /// Start a new thing at paper point (x, y), already being resized.
    /// Returns its id, or `None` before the paper and thing list are ready.
    pub fn create_at(&self, x: f64, y: f64) -> Option<u64> {
        let inner = &self.inner;
        if inner.paper.borrow().is_none() || !inner.store.borrow().is_populated() {
            log::debug!("Ignoring create at ({:.1}, {:.1}) before load", x, y);
            return None;
        }

        let time = inner.current_time();
        let id = inner.store.borrow_mut().create_at(x, y, time).id;
        self.draw_annotations();
        Some(id)
    }

    /// Pointer pressed at (x, y): grab the topmost thing there, or start a
    /// new one. Returns whether a drag started.
    pub fn begin_drag(&self, x: f64, y: f64) -> bool {
        let time = self.inner.current_time();
        let hit = self.inner.store.borrow().hit_test(x, y, time);
        match hit {
            Some(index) => {
                self.inner.store.borrow_mut().start_move(index, x, y, time);
                self.draw_annotations();
                true
            }
            None => self.create_at(x, y).is_some(),
        }
    }

    /// Pointer moved while dragging.
    pub fn drag_to(&self, x: f64, y: f64) {
        let time = self.inner.current_time();
        if self.inner.store.borrow_mut().drag_to(x, y, time) {
            self.draw_annotations();
        }
    }

    /// Pointer released.
    pub fn end_drag(&self) {
        if self.inner.store.borrow_mut().end_drag() {
            self.draw_annotations();
        }
    }

    /// Serialized thing list, as `save` would send it.
    pub fn export_records(&self) -> serde_json::Result<Vec<Value>> {
        self.inner.store.borrow().to_json()
    }

    /// Replace the thing list from records read elsewhere (a local file).
    pub fn import_records(&self, records: &[Value]) -> Result<usize, LoadError> {
        let things =
            AnnotationStore::decode(records).map_err(|e| LoadError::Decode(e.to_string()))?;
        let count = things.len();
        self.inner.store.borrow_mut().replace(things);
        self.draw_annotations();
        Ok(count)
    }

    /// Deliver pending video events to their handlers, then run the
    /// continuations that became ready. Call once per UI frame.
    pub fn pump(&self, now: Instant) {
        let events = self.inner.video.borrow_mut().poll_events(now);
        for kind in events {
            self.inner.events.dispatch(Role::Video, kind);
        }
        self.inner.event_loop.turn();
    }

    /// Forward a UI event for `role`.
    pub fn dispatch(&self, role: Role, kind: EventKind) {
        self.inner.events.dispatch(role, kind);
    }

    pub fn controls(&self) -> Ref<'_, Controls> {
        self.inner.controls.borrow()
    }

    pub fn controls_mut(&self) -> RefMut<'_, Controls> {
        self.inner.controls.borrow_mut()
    }

    pub fn paper(&self) -> Ref<'_, Option<Paper>> {
        self.inner.paper.borrow()
    }

    pub fn store(&self) -> Ref<'_, AnnotationStore> {
        self.inner.store.borrow()
    }

    pub fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.inner.video.borrow().duration()
    }

    pub fn paused(&self) -> bool {
        self.inner.video.borrow().paused()
    }

    pub fn take_frame(&self) -> Option<VideoFrame> {
        self.inner.video.borrow_mut().take_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::thing::{Bounds, DragMode, Keyframe, Thing};
    use crate::player::signal::SignalState;
    use crate::player::testing::{FakeVideo, MemoryApi};
    use serde_json::json;

    fn stored_thing(id: u64, x: f64) -> Value {
        json!({
            "id": id,
            "label": format!("thing {}", id),
            "keyframes": [
                {"time": 0.0, "bounds": {"xMin": x, "xMax": x + 10.0, "yMin": 0.0, "yMax": 10.0}},
                {"time": 10.0, "bounds": {"xMin": x + 50.0, "xMax": x + 60.0, "yMin": 0.0, "yMax": 10.0}}
            ]
        })
    }

    fn settle(player: &Player, event_loop: &EventLoop) {
        for _ in 0..4 {
            player.pump(Instant::now());
            event_loop.run_until_idle();
        }
    }

    struct Fixture {
        event_loop: EventLoop,
        video: Rc<RefCell<FakeVideo>>,
        api: Arc<MemoryApi>,
        player: Player,
    }

    fn fixture(records: Vec<Value>) -> Fixture {
        let event_loop = EventLoop::new();
        let (video, handle) = FakeVideo::unloaded();
        let api = MemoryApi::with_document("clip", records);
        let player = Player::new(handle, "clip", api.clone(), &event_loop);
        Fixture {
            event_loop,
            video,
            api,
            player,
        }
    }

    fn loaded_fixture(records: Vec<Value>) -> Fixture {
        let f = fixture(records);
        f.video.borrow_mut().finish_loading(100.0, (640, 480));
        settle(&f.player, &f.event_loop);
        assert_eq!(f.player.loaded().state(), SignalState::Resolved);
        f
    }

    #[test]
    fn test_annotations_wait_for_video_before_first_draw() {
        let f = fixture(vec![stored_thing(0, 0.0), stored_thing(1, 100.0)]);
        settle(&f.player, &f.event_loop);

        // Fetched and decoded, but nothing can be drawn yet.
        assert_eq!(f.player.store().len(), 2);
        assert_eq!(f.player.annotations_loaded().state(), SignalState::Pending);
        assert_eq!(f.player.loaded().state(), SignalState::Pending);
        assert!(f.player.paper().is_none());

        f.video.borrow_mut().finish_loading(100.0, (640, 480));
        settle(&f.player, &f.event_loop);

        assert_eq!(f.player.video_loaded().state(), SignalState::Resolved);
        assert_eq!(f.player.annotations_loaded().state(), SignalState::Resolved);
        assert_eq!(f.player.loaded().state(), SignalState::Resolved);

        let paper = f.player.paper();
        let paper = paper.as_ref().unwrap();
        assert_eq!(paper.size(), (640, 480));
        let ids: Vec<u64> = paper.shapes().iter().map(|s| s.thing_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_fetch_failure_rejects_annotations_but_not_video() {
        let f = fixture(Vec::new());
        f.api.documents.lock().unwrap().clear();
        // The constructor already fetched; load again against the empty server.
        let reload = f.player.load();
        f.video.borrow_mut().finish_loading(100.0, (640, 480));
        settle(&f.player, &f.event_loop);

        assert_eq!(f.player.video_loaded().state(), SignalState::Resolved);
        assert_eq!(reload.outcome(), Some(Err(LoadError::Fetch(ApiError::Status(404)))));
        assert!(f.player.store().is_empty());
    }

    #[test]
    fn test_network_failure_rejects_loaded() {
        let event_loop = EventLoop::new();
        let (video, handle) = FakeVideo::unloaded();
        let api = Arc::new(MemoryApi::default());
        *api.offline.lock().unwrap() = true;
        let player = Player::new(handle, "clip", api, &event_loop);

        video.borrow_mut().finish_loading(100.0, (640, 480));
        settle(&player, &event_loop);

        assert_eq!(player.video_loaded().state(), SignalState::Resolved);
        assert!(matches!(
            player.annotations_loaded().outcome(),
            Some(Err(LoadError::Fetch(ApiError::Network(_))))
        ));
        assert_eq!(player.loaded().state(), SignalState::Rejected);
        assert!(player.store().is_empty());
        // Still usable: new things can be drawn.
        assert!(player.create_at(1.0, 1.0).is_some());
    }

    #[test]
    fn test_bad_record_rejects_and_leaves_list_empty() {
        let f = fixture(vec![stored_thing(0, 0.0), json!({"label": "missing id"})]);
        f.video.borrow_mut().finish_loading(100.0, (640, 480));
        settle(&f.player, &f.event_loop);

        assert!(matches!(
            f.player.annotations_loaded().outcome(),
            Some(Err(LoadError::Decode(_)))
        ));
        assert!(f.player.store().is_empty());
    }

    #[test]
    fn test_video_abort_rejects_everything() {
        let f = fixture(vec![stored_thing(0, 0.0)]);
        f.video.borrow_mut().queued.push(EventKind::Abort);
        settle(&f.player, &f.event_loop);

        assert_eq!(f.player.video_loaded().outcome(), Some(Err(LoadError::VideoAborted)));
        assert_eq!(f.player.annotations_loaded().outcome(), Some(Err(LoadError::VideoAborted)));
        assert_eq!(f.player.loaded().state(), SignalState::Rejected);
        // A late metadata event cannot undo the abort.
        f.video.borrow_mut().finish_loading(100.0, (640, 480));
        settle(&f.player, &f.event_loop);
        assert_eq!(f.player.video_loaded().state(), SignalState::Rejected);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let f = loaded_fixture(vec![stored_thing(0, 0.0)]);
        f.player.create_at(5.0, 5.0);
        f.player.drag_to(50.0, 40.0);
        f.player.end_drag();
        let before: Vec<Thing> = f.player.store().things().to_vec();

        let saved = f.player.save();
        settle(&f.player, &f.event_loop);
        assert_eq!(saved.outcome(), Some(Ok(SAVE_OK_MESSAGE.to_string())));
        assert_eq!(f.api.document("clip").unwrap().len(), 2);

        let reload = f.player.load();
        settle(&f.player, &f.event_loop);
        assert_eq!(reload.state(), SignalState::Resolved);
        assert_eq!(f.player.store().things(), before.as_slice());
    }

    #[test]
    fn test_save_failure_reports_status_and_keeps_list() {
        let f = loaded_fixture(vec![stored_thing(0, 0.0)]);
        f.player.create_at(1.0, 2.0);
        *f.api.write_status.lock().unwrap() = Some(500);
        let before: Vec<Thing> = f.player.store().things().to_vec();

        let saved = f.player.save();
        settle(&f.player, &f.event_loop);

        let error = saved.outcome().unwrap().unwrap_err();
        assert_eq!(error, SaveError::Api(ApiError::Status(500)));
        assert!(error.to_string().contains("500"));
        assert_eq!(f.player.store().things(), before.as_slice());
        assert_eq!(f.api.document("clip").unwrap().len(), 1);
    }

    #[test]
    fn test_save_before_load_keeps_stored_document() {
        let f = fixture(vec![stored_thing(0, 0.0), stored_thing(1, 100.0)]);
        // Nothing has been fetched yet.
        let saved = f.player.save();
        settle(&f.player, &f.event_loop);

        assert_eq!(saved.outcome(), Some(Err(SaveError::NotLoaded)));
        assert_eq!(f.api.document("clip").unwrap().len(), 2);
    }

    #[test]
    fn test_create_at_appends_one_thing_in_drag_mode() {
        let f = loaded_fixture(Vec::new());
        let id = f.player.create_at(10.0, 20.0).unwrap();

        let store = f.player.store();
        assert_eq!(store.len(), 1);
        let thing = &store.things()[0];
        assert_eq!(thing.id, id);
        assert_eq!(
            thing.drawing.bounds,
            Some(Bounds {
                x_min: 10.0,
                x_max: 10.0,
                y_min: 20.0,
                y_max: 20.0
            })
        );
        assert!(matches!(thing.drawing.mode, DragMode::Resizing { .. }));
        assert!(f.player.paper().as_ref().unwrap().shapes()[0].active);
    }

    #[test]
    fn test_create_before_load_is_ignored() {
        let f = fixture(Vec::new());
        assert_eq!(f.player.create_at(10.0, 20.0), None);
        assert!(f.player.store().is_empty());
    }

    #[test]
    fn test_begin_drag_moves_topmost_existing_thing() {
        let f = loaded_fixture(vec![stored_thing(0, 0.0), stored_thing(1, 5.0)]);
        assert!(f.player.begin_drag(7.0, 5.0));
        f.player.drag_to(8.0, 5.0);
        f.player.end_drag();

        let store = f.player.store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.things()[0].keyframes[0].bounds.x_min, 0.0);
        assert_eq!(store.things()[1].keyframes[0].bounds.x_min, 6.0);
    }

    #[test]
    fn test_timeupdate_redraws_and_respects_focus() {
        let f = loaded_fixture(vec![stored_thing(0, 0.0)]);
        f.player.controls_mut().time.text = "3".to_string();
        f.player.dispatch(Role::ControlTime, EventKind::Focus);

        {
            let mut video = f.video.borrow_mut();
            video.time = 5.0;
            video.queued.push(EventKind::TimeUpdate);
        }
        settle(&f.player, &f.event_loop);

        assert_eq!(f.player.controls().time.text, "3");
        assert_eq!(f.player.controls().scrubber.raw, 500.0);
        let paper = f.player.paper();
        let shape = &paper.as_ref().unwrap().shapes()[0];
        assert_eq!(shape.bounds.x_min, 25.0);
    }

    #[test]
    fn test_import_records_replaces_list() {
        let f = loaded_fixture(vec![stored_thing(0, 0.0)]);
        let mut thing = Thing::new(9, "imported".to_string());
        thing.keyframes.push(Keyframe {
            time: 0.0,
            bounds: Bounds::at_point(1.0, 1.0),
        });

        let count = f.player.import_records(&[thing.to_json().unwrap()]).unwrap();
        assert_eq!(count, 1);
        assert_eq!(f.player.store().things()[0], thing);
        assert_eq!(f.player.export_records().unwrap().len(), 1);
    }
}
