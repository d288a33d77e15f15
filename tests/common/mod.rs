//! Shared helpers for integration tests.

#![allow(dead_code)]

use rbsync::config::{Config, MirrorBackend};
use rbsync::sync::MirrorReport;
use rbsync::{Mirror, MirrorError, MirrorJob, Settings};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Helper: get absolute path to a test fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Settings rooted in `root`, local backend, no waits, real execution.
pub fn settings(root: &Path, media_dirs: Vec<PathBuf>) -> Settings {
    let mut config = Config::default();
    config.local.media_dirs = media_dirs;
    config.local.library_dir = Some(root.join("library"));
    config.local.cover_art_dir = Some(root.join("covers"));
    config.local.workspace = root.join("workspace");
    config.remote.backend = MirrorBackend::Local;
    config.remote.media_dir = Some("/srv/media".into());
    config.remote.playlists_dir = Some("/srv/playlists".into());
    config.remote.library_dir = Some("/srv/rhythmbox".into());
    config.remote.cover_art_dir = Some("/srv/covers".into());
    config.export.startup_wait_secs = 0;
    config.export.shutdown_wait_secs = 0;
    config.phases.dry_run = false;

    Settings::from_config(&config).expect("valid test config")
}

/// Mirror double that records jobs and fails the ones whose label starts
/// with a configured prefix.
#[derive(Default)]
pub struct RecordingMirror {
    pub executed: Vec<MirrorJob>,
    pub fail_prefix: Option<String>,
}

impl RecordingMirror {
    pub fn failing(prefix: &str) -> Self {
        Self {
            fail_prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    pub fn executed_labels(&self) -> Vec<&str> {
        self.executed.iter().map(|j| j.label.as_str()).collect()
    }
}

impl Mirror for RecordingMirror {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn describe(&self, job: &MirrorJob) -> Result<String, MirrorError> {
        job.ensure_sources()?;
        Ok(format!("mirror {:?} -> {}", job.source, job.destination))
    }

    fn mirror(&mut self, job: &MirrorJob) -> Result<MirrorReport, MirrorError> {
        self.executed.push(job.clone());
        if let Some(prefix) = &self.fail_prefix {
            if job.label.starts_with(prefix.as_str()) {
                return Err(MirrorError::ExitStatus {
                    command: job.label.clone(),
                    code: Some(23),
                });
            }
        }
        Ok(MirrorReport {
            elapsed: Duration::ZERO,
            files_copied: None,
            files_deleted: None,
        })
    }
}
