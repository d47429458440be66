// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Local copies of annotation documents.
//!
//! The server stores each session as a JSON array of thing records. The
//! same array can be exported to, and imported from, a local JSON or YAML
//! file.

use anyhow::{bail, Result};
use serde_json::Value;
use std::path::Path;

/// File formats for local copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => bail!("Unsupported file extension: {:?}", extension),
        }
    }
}

/// Export annotation records to JSON format.
pub fn export_json(records: &[Value], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Export annotation records to YAML format.
pub fn export_yaml(records: &[Value], path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(records)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Import annotation records from JSON format.
pub fn import_json(path: &Path) -> Result<Vec<Value>> {
    let json = std::fs::read_to_string(path)?;
    let records = serde_json::from_str(&json)?;
    Ok(records)
}

/// Import annotation records from YAML format.
pub fn import_yaml(path: &Path) -> Result<Vec<Value>> {
    let yaml = std::fs::read_to_string(path)?;
    let records = serde_yaml::from_str(&yaml)?;
    Ok(records)
}

/// Export in the format implied by the extension.
pub fn export(records: &[Value], path: &Path) -> Result<()> {
    match DocumentFormat::from_path(path)? {
        DocumentFormat::Json => export_json(records, path),
        DocumentFormat::Yaml => export_yaml(records, path),
    }
}

/// Import in the format implied by the extension.
pub fn import(path: &Path) -> Result<Vec<Value>> {
    match DocumentFormat::from_path(path)? {
        DocumentFormat::Json => import_json(path),
        DocumentFormat::Yaml => import_yaml(path),
    }
}
