// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Remote annotation resource.
//!
//! Annotations for a session live at `/annotation/{name}` as a JSON array,
//! one object per thing. Reads are `GET`, writes are `POST` with a JSON
//! body. Calls block, so the player runs them on worker threads.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-OK HTTP response.
    #[error("Error code {0}")]
    Status(u16),

    #[error("Invalid annotation document: {0}")]
    Decode(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Request worker exited unexpectedly")]
    WorkerLost,
}

/// Get/put access to annotation documents.
pub trait AnnotationApi: Send + Sync {
    /// Read the annotation array stored under `name`.
    fn fetch(&self, name: &str) -> Result<Vec<Value>, ApiError>;

    /// Replace the annotation array stored under `name`.
    fn store(&self, name: &str, records: &[Value]) -> Result<(), ApiError>;
}

/// `AnnotationApi` over HTTP.
pub struct HttpAnnotationApi {
    base_url: reqwest::Url,
    client: reqwest::blocking::Client,
}

impl HttpAnnotationApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let base_url = reqwest::Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base_url, client })
    }

    /// `{base}/annotation/{name}`, with `name` percent-encoded as a single
    /// path segment.
    pub fn resource_url(&self, name: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("annotation").push(name);
        }
        url
    }
}

impl AnnotationApi for HttpAnnotationApi {
    fn fetch(&self, name: &str) -> Result<Vec<Value>, ApiError> {
        let url = self.resource_url(name);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        response
            .json::<Vec<Value>>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn store(&self, name: &str, records: &[Value]) -> Result<(), ApiError> {
        let url = self.resource_url(name);
        log::debug!("POST {} ({} records)", url, records.len());

        // `json` sets `Content-Type: application/json`.
        let response = self
            .client
            .post(url)
            .json(records)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(status.as_u16()))
        }
    }
}
