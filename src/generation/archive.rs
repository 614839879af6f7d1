//! Raw model responses and their per-request on-disk handles.
//!
//! Each response is kept as an owned value that travels through the pipeline
//! with its request. When archiving is enabled every response gets its own
//! uniquely named file, so concurrent requests never read each other's text.

use crate::error::{ForgeError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

#[derive(Debug, Clone)]
pub struct RawResponse {
    text: String,
    received_at: DateTime<Utc>,
    handle: Option<PathBuf>,
}

impl RawResponse {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: PathBuf) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Archive file this response was stored in or loaded from, if any.
    pub fn handle(&self) -> Option<&Path> {
        self.handle.as_deref()
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ForgeError::InvalidInput {
            message: format!("cannot read response file {}: {}", path.display(), e),
        })?;
        Ok(Self::new(text).with_handle(path.to_path_buf()))
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::new(text))
    }
}

pub struct ResponseArchive {
    directory: PathBuf,
}

impl ResponseArchive {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist `response` under a fresh name and attach that path as its handle.
    pub fn store(&self, response: RawResponse) -> Result<RawResponse> {
        fs::create_dir_all(&self.directory)?;

        let prefix = format!(
            "response-{}-",
            response.received_at.format("%Y%m%dT%H%M%S%.3fZ")
        );
        let mut file = Builder::new()
            .prefix(&prefix)
            .suffix(".txt")
            .tempfile_in(&self.directory)?;
        file.write_all(response.text.as_bytes())?;
        file.flush()?;

        let (_, path) = file
            .keep()
            .map_err(|e| ForgeError::Io(io::Error::from(e)))?;

        log::debug!("archived response to {}", path.display());
        Ok(response.with_handle(path))
    }

    pub fn load<P: AsRef<Path>>(&self, handle: P) -> Result<RawResponse> {
        RawResponse::read_from_file(handle)
    }
}
