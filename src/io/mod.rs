// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media, the annotation server, and local files.

pub mod api;
pub mod media;
pub mod serialization;
