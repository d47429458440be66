// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Test doubles for the player.

use super::binder::SharedVideo;
use crate::io::api::{AnnotationApi, ApiError};
use crate::io::media::VideoResource;
use crate::player::events::EventKind;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Scriptable video state. Tests mutate the fields directly.
#[derive(Debug)]
pub struct FakeVideo {
    pub time: f64,
    pub duration: f64,
    pub size: Option<(u32, u32)>,
    pub paused: bool,
    pub queued: Vec<EventKind>,
}

impl FakeVideo {
    /// A loaded video plus the boxed resource the player takes.
    pub fn loaded(duration: f64, size: (u32, u32)) -> (Rc<RefCell<FakeVideo>>, Box<dyn VideoResource>) {
        let state = Rc::new(RefCell::new(FakeVideo {
            time: 0.0,
            duration,
            size: Some(size),
            paused: true,
            queued: Vec::new(),
        }));
        (state.clone(), Box::new(FakeVideoHandle(state)))
    }

    /// A video whose metadata has not arrived yet.
    pub fn unloaded() -> (Rc<RefCell<FakeVideo>>, Box<dyn VideoResource>) {
        let (state, handle) = Self::loaded(f64::NAN, (0, 0));
        state.borrow_mut().size = None;
        (state, handle)
    }

    /// A loaded video behind the shared handle the binder uses.
    pub fn shared(duration: f64, size: (u32, u32)) -> (Rc<RefCell<FakeVideo>>, SharedVideo) {
        let (state, handle) = Self::loaded(duration, size);
        (state, Rc::new(RefCell::new(handle)))
    }

    /// Metadata arrives.
    pub fn finish_loading(&mut self, duration: f64, size: (u32, u32)) {
        self.duration = duration;
        self.size = Some(size);
        self.queued.push(EventKind::LoadedMetadata);
    }
}

struct FakeVideoHandle(Rc<RefCell<FakeVideo>>);

impl VideoResource for FakeVideoHandle {
    fn current_time(&self) -> f64 {
        self.0.borrow().time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut video = self.0.borrow_mut();
        video.time = seconds;
        video.queued.push(EventKind::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.0.borrow().duration
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        self.0.borrow().size
    }

    fn play(&mut self) {
        self.0.borrow_mut().paused = false;
    }

    fn pause(&mut self) {
        self.0.borrow_mut().paused = true;
    }

    fn paused(&self) -> bool {
        self.0.borrow().paused
    }

    fn poll_events(&mut self, _now: Instant) -> Vec<EventKind> {
        std::mem::take(&mut self.0.borrow_mut().queued)
    }
}

/// In-memory annotation server.
#[derive(Debug, Default)]
pub struct MemoryApi {
    pub documents: Mutex<HashMap<String, Vec<Value>>>,
    /// When set, every write answers with this status.
    pub write_status: Mutex<Option<u16>>,
    /// When set, every read fails with a network error.
    pub offline: Mutex<bool>,
}

impl MemoryApi {
    pub fn with_document(name: &str, records: Vec<Value>) -> Arc<Self> {
        let api = MemoryApi::default();
        api.documents
            .lock()
            .unwrap()
            .insert(name.to_string(), records);
        Arc::new(api)
    }

    pub fn document(&self, name: &str) -> Option<Vec<Value>> {
        self.documents.lock().unwrap().get(name).cloned()
    }
}

impl AnnotationApi for MemoryApi {
    fn fetch(&self, name: &str) -> Result<Vec<Value>, ApiError> {
        if *self.offline.lock().unwrap() {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        self.documents
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or(ApiError::Status(404))
    }

    fn store(&self, name: &str, records: &[Value]) -> Result<(), ApiError> {
        if let Some(status) = *self.write_status.lock().unwrap() {
            return Err(ApiError::Status(status));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(name.to_string(), records.to_vec());
        Ok(())
    }
}
