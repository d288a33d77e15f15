//! Mirror trait - Abstraction for the "copy this tree to the remote" step.

use crate::error::MirrorError;
use std::path::PathBuf;
use std::time::Duration;

/// What to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorSource {
    /// The directory itself: `<dir>` ends up at `<destination>/<dir name>`.
    Directory(PathBuf),
    /// Only the directory's contents, placed directly in `<destination>`.
    Contents(PathBuf),
    /// Individual files placed directly in `<destination>`.
    Files(Vec<PathBuf>),
}

/// Permission bits forced on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChmodPolicy {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl ChmodPolicy {
    /// rwxr-xr-x directories, rw-r--r-- files.
    pub fn media() -> Self {
        Self {
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorJob {
    /// Short name used in logs ("database", "cover art", ...).
    pub label: String,
    pub source: MirrorSource,
    /// Path on the remote machine.
    pub destination: String,
    pub chmod: Option<ChmodPolicy>,
}

impl MirrorJob {
    pub fn new(label: impl Into<String>, source: MirrorSource, destination: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source,
            destination: destination.into(),
            chmod: None,
        }
    }

    pub fn with_chmod(mut self, chmod: ChmodPolicy) -> Self {
        self.chmod = Some(chmod);
        self
    }

    /// An empty file list has nothing to mirror.
    pub fn ensure_sources(&self) -> Result<(), MirrorError> {
        match &self.source {
            MirrorSource::Files(files) if files.is_empty() => {
                Err(MirrorError::NoSources(self.label.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Result of a finished mirror invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub elapsed: Duration,
    /// Files written, when the backend can tell.
    pub files_copied: Option<usize>,
    /// Remote entries removed because they no longer exist locally.
    pub files_deleted: Option<usize>,
}

/// Trait for all mirror backends.
///
/// A mirror makes the destination match the source, deleting destination
/// entries that are no longer present, so repeated runs converge.
pub trait Mirror {
    /// Backend name (rsync, local)
    fn name(&self) -> &'static str;

    /// The exact command (or equivalent) `mirror` would perform.
    fn describe(&self, job: &MirrorJob) -> Result<String, MirrorError>;

    /// Perform the job, blocking until it finishes.
    fn mirror(&mut self, job: &MirrorJob) -> Result<MirrorReport, MirrorError>;
}
