//! Orchestrator - Runs the export and sync phases in their fixed order.
//!
//! export -> library -> media -> playlists, each behind its own switch.
//! A failing phase is logged and the next one still runs. The playlist phase
//! reads whatever `.m3u` files are in the workspace; if export was skipped
//! those are leftovers from an earlier run kept with `keep_workspace`.

use crate::config::{Settings, PLAYLISTS_FILE, RHYTHMDB_FILE};
use crate::player::{export_playlists, ExportReport, PlayerControl};
use crate::rewrite::{
    discover_playlists, rewrite_document_file, rewrite_playlist_file, DocumentKind, RewriteStats,
};
use crate::sync::{ChmodPolicy, Mirror, MirrorJob, MirrorReport, MirrorSource};
use crate::translate::PathTranslator;
use crate::workspace::ScratchWorkspace;
use anyhow::Result;
use std::fmt;
use std::thread;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Library,
    Media,
    Playlists,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Library => "library",
            Self::Media => "media",
            Self::Playlists => "playlists",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    /// Dry run: composed and logged, not executed.
    Skipped,
    Completed(MirrorReport),
    Failed(String),
}

/// One mirror invocation as planned and (maybe) performed.
#[derive(Debug, Clone)]
pub struct MirrorRecord {
    pub phase: Phase,
    pub label: String,
    pub command: Option<String>,
    pub status: MirrorStatus,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub export: Option<ExportReport>,
    pub library: Option<RewriteStats>,
    pub playlists: Option<RewriteStats>,
    pub mirrors: Vec<MirrorRecord>,
    pub workspace_removed: bool,
}

impl RunReport {
    pub fn mirror_failures(&self) -> usize {
        self.mirrors
            .iter()
            .filter(|m| matches!(m.status, MirrorStatus::Failed(_)))
            .count()
    }

    pub fn unmatched_paths(&self) -> usize {
        [self.library, self.playlists]
            .iter()
            .flatten()
            .map(|s| s.unmatched)
            .sum()
    }
}

pub struct Orchestrator<'a> {
    settings: &'a Settings,
    player: &'a mut dyn PlayerControl,
    mirror: &'a mut dyn Mirror,
    translator: PathTranslator,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        settings: &'a Settings,
        player: &'a mut dyn PlayerControl,
        mirror: &'a mut dyn Mirror,
    ) -> Self {
        Self {
            settings,
            player,
            mirror,
            translator: settings.translator(),
        }
    }

    /// Run every enabled phase, then discard the workspace unless kept.
    ///
    /// Only workspace setup and removal can fail the run itself.
    pub fn run(&mut self) -> Result<RunReport> {
        let phases = self.settings.phases;
        info!("[Sync] Using the {} mirror backend", self.mirror.name());
        let workspace = ScratchWorkspace::open(&self.settings.workspace)?;
        let mut report = RunReport::default();

        if phases.export {
            report.export = Some(self.export_phase(&workspace));
        }
        if phases.sync_library {
            report.library = Some(self.library_phase(&workspace, &mut report.mirrors));
        }
        if phases.sync_media {
            self.media_phase(&mut report.mirrors);
        }
        if phases.sync_playlists {
            report.playlists = Some(self.playlists_phase(&workspace, &mut report.mirrors));
        }

        report.workspace_removed = workspace.finish(phases.keep_workspace)?;
        info!(
            "[Sync] Done: {} mirror job(s), {} failed, {} unmatched path(s)",
            report.mirrors.len(),
            report.mirror_failures(),
            report.unmatched_paths()
        );
        Ok(report)
    }

    fn export_phase(&mut self, workspace: &ScratchWorkspace) -> ExportReport {
        let settings = self.settings;
        let export = &settings.export;
        self.player.ensure_running();
        info!(
            "[Export] Pausing {:?} for Rhythmbox initialization",
            export.startup_wait
        );
        thread::sleep(export.startup_wait);

        match export_playlists(self.player, workspace.root(), export) {
            Ok(report) => report,
            Err(err) => {
                error!("[Export] Cannot list playlists: {}", err);
                ExportReport {
                    entries: Vec::new(),
                    halted: true,
                }
            }
        }
    }

    fn library_phase(
        &mut self,
        workspace: &ScratchWorkspace,
        mirrors: &mut Vec<MirrorRecord>,
    ) -> RewriteStats {
        info!("[Sync] Syncing Rhythmbox data...");
        let settings = self.settings;
        // The database is only flushed to disk when Rhythmbox exits.
        self.player.request_quit();
        info!(
            "[Sync] Pausing {:?} for Rhythmbox shutdown",
            settings.export.shutdown_wait
        );
        thread::sleep(settings.export.shutdown_wait);

        let mut stats = RewriteStats::default();
        let mut written = Vec::new();
        for (file, kind) in [
            (RHYTHMDB_FILE, DocumentKind::Database),
            (PLAYLISTS_FILE, DocumentKind::Playlists),
        ] {
            let src = settings.library_dir.join(file);
            let dst = workspace.root().join(file);
            match rewrite_document_file(&src, &dst, kind, &self.translator) {
                Ok(doc_stats) => {
                    info!(
                        "[Rewrite] {}: {} rewritten, {} unmatched",
                        file, doc_stats.rewritten, doc_stats.unmatched
                    );
                    stats += doc_stats;
                    written.push(dst);
                }
                Err(e) => error!("[Rewrite] {:#}", e),
            }
        }

        let remote = &settings.remote;
        self.execute(
            Phase::Library,
            MirrorJob::new(
                "database",
                MirrorSource::Files(written),
                remote.library_dir.clone(),
            ),
            mirrors,
        );
        self.execute(
            Phase::Library,
            MirrorJob::new(
                "cover art",
                MirrorSource::Contents(settings.cover_art_dir.clone()),
                remote.cover_art_dir.clone(),
            ),
            mirrors,
        );
        stats
    }

    fn media_phase(&mut self, mirrors: &mut Vec<MirrorRecord>) {
        info!("[Sync] Syncing media files...");
        let settings = self.settings;
        let destination = format!("{}/", settings.remote.media_dir.trim_end_matches('/'));
        for dir in &settings.media_dirs {
            let job = MirrorJob::new(
                format!("media {}", dir.display()),
                MirrorSource::Directory(dir.clone()),
                destination.clone(),
            )
            .with_chmod(ChmodPolicy::media());
            self.execute(Phase::Media, job, mirrors);
        }
    }

    fn playlists_phase(
        &mut self,
        workspace: &ScratchWorkspace,
        mirrors: &mut Vec<MirrorRecord>,
    ) -> RewriteStats {
        info!("[Sync] Syncing playlists...");
        let settings = self.settings;
        let format = settings.export.format;
        let mut stats = RewriteStats::default();

        let rewritten_dir = match workspace.rewritten_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("[Sync] {:#}", e);
                return stats;
            }
        };

        match discover_playlists(workspace.root(), format) {
            Ok(sources) => {
                if sources.is_empty() {
                    warn!(
                        "[Sync] No .{} files in {}",
                        format.extension(),
                        workspace.root().display()
                    );
                }
                for src in sources {
                    match rewrite_playlist_file(&src, &rewritten_dir, &self.translator) {
                        Ok((_, file_stats)) => stats += file_stats,
                        Err(e) => error!("[Rewrite] {:#}", e),
                    }
                }
            }
            Err(e) => error!("[Sync] {:#}", e),
        }

        let files = discover_playlists(&rewritten_dir, format).unwrap_or_else(|e| {
            error!("[Sync] {:#}", e);
            Vec::new()
        });
        self.execute(
            Phase::Playlists,
            MirrorJob::new(
                "playlists",
                MirrorSource::Files(files),
                settings.remote.playlists_dir.clone(),
            ),
            mirrors,
        );
        stats
    }

    fn execute(&mut self, phase: Phase, job: MirrorJob, mirrors: &mut Vec<MirrorRecord>) {
        let command = match self.mirror.describe(&job) {
            Ok(command) => command,
            Err(e) => {
                error!("[Sync] Cannot mirror {}: {}", job.label, e);
                mirrors.push(MirrorRecord {
                    phase,
                    label: job.label,
                    command: None,
                    status: MirrorStatus::Failed(e.to_string()),
                });
                return;
            }
        };

        let status = if self.settings.phases.dry_run {
            info!("[Sync] Dry run, not executing: {}", command);
            MirrorStatus::Skipped
        } else {
            match self.mirror.mirror(&job) {
                Ok(done) => {
                    info!("[Sync] Mirrored {} in {:?}", job.label, done.elapsed);
                    MirrorStatus::Completed(done)
                }
                Err(e) => {
                    error!("[Sync] Mirror of {} failed: {}", job.label, e);
                    MirrorStatus::Failed(e.to_string())
                }
            }
        };

        mirrors.push(MirrorRecord {
            phase,
            label: job.label,
            command: Some(command),
            status,
        });
    }
}
