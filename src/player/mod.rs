// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Player core: load coordination, playback binding, and the session that
//! owns the annotated things.

pub mod binder;
pub mod event_loop;
pub mod events;
pub mod paper;
pub mod session;
pub mod signal;

#[cfg(test)]
pub mod testing;
