use crate::error::{ForgeError, Result};
use crate::materializer::MaterializeStrategy;
use crate::sections::{Extraction, ParseWarning, ParsedSections, SchemaKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Body was empty or whitespace-only.
    Empty,
    /// Section name has no entry in the filename table.
    NoFilename,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    Written {
        section: String,
        filename: String,
        bytes: u64,
    },
    Skipped {
        section: String,
        reason: SkipReason,
    },
}

impl SectionOutcome {
    pub fn section(&self) -> &str {
        match self {
            SectionOutcome::Written { section, .. } | SectionOutcome::Skipped { section, .. } => {
                section
            }
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            SectionOutcome::Written { filename, .. } => Some(filename.as_str()),
            SectionOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, SectionOutcome::Written { .. })
    }
}

impl fmt::Display for SectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionOutcome::Written {
                section,
                filename,
                bytes,
            } => write!(f, "Saved {} to {} ({} bytes)", section, filename, bytes),
            SectionOutcome::Skipped {
                section,
                reason: SkipReason::Empty,
            } => write!(f, "Skipped {}, section is empty", section),
            SectionOutcome::Skipped {
                section,
                reason: SkipReason::NoFilename,
            } => write!(f, "Skipped {}, no output file is defined for it", section),
        }
    }
}

/// Everything a caller needs to show after one parse/materialize run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub schema: SchemaKind,
    pub extraction: Option<Extraction>,
    pub output_directory: PathBuf,
    pub strategy: MaterializeStrategy,
    pub dry_run: bool,
    pub outcomes: Vec<SectionOutcome>,
    pub sections: ParsedSections,
    pub files: Vec<String>,
    pub response_handle: Option<PathBuf>,
    pub generated_at: DateTime<Utc>,
}

impl BuildReport {
    pub fn written_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.written_count()
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        self.sections.warnings()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }
}

/// Relative paths of every regular file under `dir`, sorted.
pub fn list_output_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ForgeError::Io(e.into()))?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }

    Ok(files)
}
