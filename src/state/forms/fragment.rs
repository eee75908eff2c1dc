//! Address fragment persistence
//!
//! A snapshot is stored as `#<base64url(json)>` with the padding stripped.
//! Decoding is strict, restoring is soft: a corrupt fragment is logged and
//! treated as an empty snapshot so the form stays usable.

use super::field::{FieldValue, FormSnapshot};
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a fragment could not be turned back into a snapshot
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("fragment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("fragment does not decode to a snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Page address holding the fragment
pub trait Location {
    /// Current fragment without the leading `#`, if any
    fn fragment(&self) -> Option<String>;

    /// Replace the fragment in place without adding a history entry
    fn replace_fragment(&mut self, fragment: Option<&str>);

    /// Full address including the fragment
    fn href(&self) -> String;
}

/// Encode a snapshot; `None` for an empty one so the fragment is cleared
pub fn encode(snapshot: &FormSnapshot) -> Option<String> {
    if snapshot.is_empty() {
        return None;
    }
    match serde_json::to_vec(snapshot) {
        Ok(json) => Some(URL_SAFE_NO_PAD.encode(json)),
        Err(err) => {
            tracing::warn!("Failed to encode snapshot: {err}");
            None
        }
    }
}

/// Decode a fragment, with or without its leading `#`
pub fn decode(fragment: &str) -> Result<FormSnapshot, FragmentError> {
    let trimmed = fragment.trim().trim_start_matches('#');
    if trimmed.is_empty() {
        return Ok(FormSnapshot::new());
    }

    let mut padded = trimmed.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let bytes = URL_SAFE.decode(padded.as_bytes())?;
    let raw: IndexMap<String, serde_json::Value> = serde_json::from_slice(&bytes)?;

    let mut snapshot = FormSnapshot::new();
    for (key, value) in raw {
        match FieldValue::from_json(value) {
            Some(value) => snapshot.insert(key, value),
            None => tracing::debug!("Skipping fragment key {key} without a usable value"),
        }
    }
    Ok(snapshot)
}

/// Write the snapshot to the location, clearing it when empty
pub fn persist(location: &mut dyn Location, snapshot: &FormSnapshot) {
    let encoded = encode(snapshot);
    location.replace_fragment(encoded.as_deref());
}

/// Read the snapshot from the location; corruption yields an empty snapshot
pub fn restore(location: &dyn Location) -> FormSnapshot {
    let Some(fragment) = location.fragment() else {
        return FormSnapshot::new();
    };
    match decode(&fragment) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!("Discarding corrupt address fragment: {err}");
            FormSnapshot::new()
        }
    }
}

/// Location kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    base: String,
    fragment: Option<String>,
}

impl MemoryLocation {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            fragment: None,
        }
    }

    /// Build from a full address, splitting off the fragment
    pub fn from_url(url: &str) -> Self {
        let (base, fragment) = split_url(url);
        Self {
            base: base.to_string(),
            fragment: fragment.map(str::to_string),
        }
    }

    /// Keep `base` but take the fragment of `url`
    pub fn rebased(base: &str, url: &str) -> Self {
        let (_, fragment) = split_url(url);
        Self {
            base: base.to_string(),
            fragment: fragment.map(str::to_string),
        }
    }
}

impl Location for MemoryLocation {
    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, fragment: Option<&str>) {
        self.fragment = fragment.map(str::to_string);
    }

    fn href(&self) -> String {
        join_url(&self.base, self.fragment.as_deref())
    }
}

/// Location mirrored into a file so a relaunch picks up where it left off
#[derive(Debug, Clone)]
pub struct SessionLocation {
    current: MemoryLocation,
    path: PathBuf,
}

impl SessionLocation {
    /// Open the stored address, or start from `base` when there is none
    ///
    /// An explicit `address` wins over the stored one.
    pub fn open(path: PathBuf, base: &str, address: Option<&str>) -> Self {
        let current = match address {
            Some(address) => MemoryLocation::from_url(address),
            None => match fs::read_to_string(&path) {
                Ok(stored) => MemoryLocation::rebased(base, stored.trim()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    MemoryLocation::new(base)
                }
                Err(err) => {
                    tracing::warn!("Failed to read {}: {err}", path.display());
                    MemoryLocation::new(base)
                }
            },
        };
        Self { current, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, self.current.href())
    }
}

impl Location for SessionLocation {
    fn fragment(&self) -> Option<String> {
        self.current.fragment()
    }

    fn replace_fragment(&mut self, fragment: Option<&str>) {
        self.current.replace_fragment(fragment);
        if let Err(err) = self.store() {
            tracing::warn!("Failed to store address in {}: {err}", self.path.display());
        }
    }

    fn href(&self) -> String {
        self.current.href()
    }
}

/// Split `base#fragment`; an empty fragment counts as none
pub fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, fragment)) if !fragment.is_empty() => (base, Some(fragment)),
        Some((base, _)) => (base, None),
        None => (url, None),
    }
}

pub fn join_url(base: &str, fragment: Option<&str>) -> String {
    match fragment {
        Some(fragment) => format!("{base}#{fragment}"),
        None => base.to_string(),
    }
}
