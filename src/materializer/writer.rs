//! Turns parsed sections into a directory of files.
//!
//! The target directory is owned by the materializer: whatever it held before
//! a run is gone afterwards, and it ends up with exactly one file per
//! non-empty section.

use crate::error::{ForgeError, Result};
use crate::materializer::report::{SectionOutcome, SkipReason};
use crate::sections::{filename_for, ParsedSections};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tempfile::{Builder, NamedTempFile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaterializeStrategy {
    /// Build in a sibling staging directory, then swap it into place
    #[default]
    StagedSwap,
    /// Delete and recreate the directory, then write files into it
    InPlace,
}

impl fmt::Display for MaterializeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeStrategy::StagedSwap => write!(f, "staged-swap"),
            MaterializeStrategy::InPlace => write!(f, "in-place"),
        }
    }
}

pub struct Materializer {
    output_dir: PathBuf,
    strategy: MaterializeStrategy,
}

impl Materializer {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            strategy: MaterializeStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: MaterializeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn strategy(&self) -> MaterializeStrategy {
        self.strategy
    }

    /// Replace the output directory with one file per non-empty section.
    ///
    /// Runs against the same directory are serialized within this process.
    ///
    /// With [`MaterializeStrategy::InPlace`] a failure after the reset leaves
    /// the directory holding only the files written so far. With
    /// [`MaterializeStrategy::StagedSwap`] a failure while writing leaves the
    /// previous directory untouched. The swap itself is two renames: between
    /// moving the old directory aside and moving the new one in, the output
    /// path briefly does not exist.
    ///
    /// An output path that exists but is not a directory is never replaced;
    /// both strategies fail with [`ForgeError::ResetFailed`].
    pub fn materialize(&self, parsed: &ParsedSections) -> Result<Vec<SectionOutcome>> {
        let (key, lock) = directory_lock(&self.output_dir);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            match self.strategy {
                MaterializeStrategy::InPlace => self.materialize_in_place(parsed),
                MaterializeStrategy::StagedSwap => self.materialize_staged(parsed),
            }
        };
        release_directory_lock(key, lock);
        let outcomes = result?;

        for outcome in &outcomes {
            log::info!("{}", outcome);
        }

        Ok(outcomes)
    }

    /// Outcomes a run would produce, without touching the filesystem.
    pub fn plan(&self, parsed: &ParsedSections) -> Vec<SectionOutcome> {
        parsed
            .iter()
            .map(|(section, body)| match planned_file(section, body) {
                Ok(filename) => SectionOutcome::Written {
                    section: section.to_string(),
                    filename: filename.to_string(),
                    bytes: body.trim().len() as u64,
                },
                Err(reason) => SectionOutcome::Skipped {
                    section: section.to_string(),
                    reason,
                },
            })
            .collect()
    }

    fn materialize_in_place(&self, parsed: &ParsedSections) -> Result<Vec<SectionOutcome>> {
        reset_directory(&self.output_dir)?;
        write_sections(&self.output_dir, parsed)
    }

    fn materialize_staged(&self, parsed: &ParsedSections) -> Result<Vec<SectionOutcome>> {
        let target = &self.output_dir;
        let reset_failed = |source: io::Error| ForgeError::ResetFailed {
            path: target.clone(),
            source,
        };

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                reset_failed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "output directory path has no final component",
                ))
            })?;
        ensure_not_a_file(target).map_err(reset_failed)?;

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(reset_failed)?;

        let staging = Builder::new()
            .prefix(&format!(".{}.staging-", name))
            .tempdir_in(&parent)
            .map_err(reset_failed)?;
        make_servable(staging.path()).map_err(reset_failed)?;

        // Dropping `staging` on error removes the partial tree; the target is untouched.
        let outcomes = write_sections(staging.path(), parsed)?;

        let swap_failed = |source: io::Error| ForgeError::SwapFailed {
            path: target.clone(),
            source,
        };

        let previous = if target.exists() {
            let holder = Builder::new()
                .prefix(&format!(".{}.previous-", name))
                .tempdir_in(&parent)
                .map_err(swap_failed)?;
            let moved = holder.path().join(&name);
            fs::rename(target, &moved).map_err(swap_failed)?;
            Some((holder, moved))
        } else {
            None
        };

        if let Err(e) = fs::rename(staging.path(), target) {
            if let Some((_, moved)) = &previous {
                if let Err(restore) = fs::rename(moved, target) {
                    log::error!(
                        "could not restore previous output {}: {}",
                        target.display(),
                        restore
                    );
                }
            }
            return Err(swap_failed(e));
        }

        if let Some((holder, _)) = previous {
            if let Err(e) = holder.close() {
                log::warn!("could not remove previous output: {}", e);
            }
        }

        Ok(outcomes)
    }
}

/// Parse-result-to-directory in one call, using the default strategy.
pub fn materialize<P: Into<PathBuf>>(
    parsed: &ParsedSections,
    output_dir: P,
) -> Result<Vec<SectionOutcome>> {
    Materializer::new(output_dir).materialize(parsed)
}

fn planned_file(section: &str, body: &str) -> std::result::Result<&'static str, SkipReason> {
    if body.trim().is_empty() {
        return Err(SkipReason::Empty);
    }
    filename_for(section).ok_or(SkipReason::NoFilename)
}

fn reset_directory(dir: &Path) -> Result<()> {
    let reset_failed = |source: io::Error| ForgeError::ResetFailed {
        path: dir.to_path_buf(),
        source,
    };

    ensure_not_a_file(dir).map_err(reset_failed)?;
    if dir.is_dir() {
        fs::remove_dir_all(dir).map_err(reset_failed)?;
    }
    fs::create_dir_all(dir).map_err(reset_failed)?;

    Ok(())
}

fn write_sections(dir: &Path, parsed: &ParsedSections) -> Result<Vec<SectionOutcome>> {
    let mut outcomes = Vec::with_capacity(parsed.len());

    for (section, body) in parsed.iter() {
        let filename = match planned_file(section, body) {
            Ok(filename) => filename,
            Err(reason) => {
                outcomes.push(SectionOutcome::Skipped {
                    section: section.to_string(),
                    reason,
                });
                continue;
            }
        };

        let bytes = write_file_atomic(&dir.join(filename), body.trim()).map_err(|source| {
            ForgeError::WriteFailed {
                section: section.to_string(),
                filename: filename.to_string(),
                source,
            }
        })?;

        outcomes.push(SectionOutcome::Written {
            section: section.to_string(),
            filename: filename.to_string(),
            bytes,
        });
    }

    Ok(outcomes)
}

// Readers see either no file or the complete contents.
fn write_file_atomic(path: &Path, contents: &str) -> io::Result<u64> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    make_servable(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(contents.len() as u64)
}

// tempfile creates owner-only entries; the static server may run as another user.
#[cfg(unix)]
fn make_servable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = if path.is_dir() { 0o755 } else { 0o644 };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn make_servable(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn ensure_not_a_file(path: &Path) -> io::Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "output path exists and is not a directory",
        ));
    }
    Ok(())
}

type LockTable = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

fn lock_table() -> &'static LockTable {
    static LOCKS: OnceLock<LockTable> = OnceLock::new();
    LOCKS.get_or_init(Default::default)
}

// Absolute path with the parent resolved, so `a/../game` and `game` share a key.
fn lock_key(dir: &Path) -> PathBuf {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    };

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}

fn directory_lock(dir: &Path) -> (PathBuf, Arc<Mutex<()>>) {
    let key = lock_key(dir);
    let mut locks = lock_table().lock().unwrap_or_else(PoisonError::into_inner);
    let lock = locks.entry(key.clone()).or_default().clone();
    (key, lock)
}

// Drops the table entry once no other run holds or waits on it.
fn release_directory_lock(key: PathBuf, lock: Arc<Mutex<()>>) {
    let mut locks = lock_table().lock().unwrap_or_else(PoisonError::into_inner);
    if Arc::strong_count(&lock) == 2 {
        locks.remove(&key);
    }
}
