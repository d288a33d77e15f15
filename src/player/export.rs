//! Playlist export - drives `ExportPlaylist` over every known playlist.
//!
//! A `NoReply` failure restarts the player and moves on to the next
//! playlist; the failed one is not retried in the same run. Any other
//! failure stops the phase immediately.

use crate::config::{ExportSettings, PlaylistFormat};
use crate::error::PlayerError;
use crate::player::PlayerControl;
use std::path::Path;
use std::thread;
use tracing::{debug, error, info, warn};

/// A playlist as enumerated by the player plus the file it exports to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDescriptor {
    pub name: String,
    pub file_name: String,
}

impl PlaylistDescriptor {
    /// Characters other than word characters and whitespace become `_`.
    pub fn new(name: &str, format: PlaylistFormat) -> Self {
        let stem: String = name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            name: name.to_string(),
            file_name: format!("{}.{}", stem, format.extension()),
        }
    }

    pub fn destination_uri(&self, workspace: &Path) -> String {
        format!("file://{}", workspace.join(&self.file_name).display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Succeeded,
    SkippedByPolicy,
    FailedTransient(PlayerError),
    FailedFatal(PlayerError),
}

/// Per-playlist outcomes of one export phase, in attempt order.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub entries: Vec<(PlaylistDescriptor, ExportOutcome)>,
    /// Whether a fatal failure stopped the phase early.
    pub halted: bool,
}

impl ExportReport {
    fn count(&self, pred: impl Fn(&ExportOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, ExportOutcome::Succeeded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ExportOutcome::SkippedByPolicy))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                ExportOutcome::FailedTransient(_) | ExportOutcome::FailedFatal(_)
            )
        })
    }
}

/// Export every non-skipped playlist into `workspace`.
///
/// Only a failure to enumerate playlists is returned as `Err`; per-playlist
/// failures end up in the report.
pub fn export_playlists(
    player: &mut dyn PlayerControl,
    workspace: &Path,
    settings: &ExportSettings,
) -> Result<ExportReport, PlayerError> {
    info!("[Export] Exporting playlists...");
    let as_m3u = settings.format.is_m3u();
    debug!("[Export] as_m3u: {}", as_m3u);

    let names = player.list_playlists()?;
    let mut report = ExportReport::default();

    for name in names {
        let descriptor = PlaylistDescriptor::new(&name, settings.format);

        if settings.skip_playlists.contains(&name) {
            debug!("[Export] Skipping '{}'", name);
            report.entries.push((descriptor, ExportOutcome::SkippedByPolicy));
            continue;
        }

        let uri = descriptor.destination_uri(workspace);
        info!("[Export] Exporting '{}' to '{}'", name, descriptor.file_name);
        debug!("[Export] URI: {}", uri);

        match player.export_playlist(&name, &uri, as_m3u) {
            Ok(()) => report.entries.push((descriptor, ExportOutcome::Succeeded)),
            Err(err) if err.is_transient() => {
                error!("[Export] Failed to export playlist '{}': {}", name, err);
                error!("[Export] Perhaps it was empty? Restarting Rhythmbox...");
                recover(player, settings);
                report
                    .entries
                    .push((descriptor, ExportOutcome::FailedTransient(err)));
            }
            Err(err) => {
                error!("[Export] Failed to export playlist '{}': {}", name, err);
                error!("[Export] Stopping export, remaining playlists are not attempted");
                report.entries.push((descriptor, ExportOutcome::FailedFatal(err)));
                report.halted = true;
                break;
            }
        }
    }

    info!(
        "[Export] {} exported, {} skipped, {} failed",
        report.succeeded(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

fn recover(player: &mut dyn PlayerControl, settings: &ExportSettings) {
    player.ensure_running();
    info!(
        "[Export] Pausing {:?} for Rhythmbox initialization",
        settings.startup_wait
    );
    thread::sleep(settings.startup_wait);
    if let Err(err) = player.reconnect() {
        warn!("[Export] Cannot reach the playlist manager again: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ScriptedPlayer;
    use std::time::Duration;

    fn settings(skip: &[&str]) -> ExportSettings {
        ExportSettings {
            format: PlaylistFormat::M3u,
            skip_playlists: skip.iter().map(|s| s.to_string()).collect(),
            startup_wait: Duration::ZERO,
            shutdown_wait: Duration::ZERO,
        }
    }

    fn no_reply() -> PlayerError {
        PlayerError::rpc("org.freedesktop.DBus.Error.NoReply", "Did not receive a reply")
    }

    #[test]
    fn test_descriptor_file_name() {
        let d = PlaylistDescriptor::new("Rock & Roll: 70's", PlaylistFormat::M3u);
        assert_eq!(d.file_name, "Rock _ Roll_ 70_s.m3u");
        let d = PlaylistDescriptor::new("Café_Mix 2", PlaylistFormat::M3u);
        assert_eq!(d.file_name, "Café_Mix 2.m3u");
    }

    #[test]
    fn test_destination_uri() {
        let d = PlaylistDescriptor::new("Road Trip", PlaylistFormat::M3u);
        assert_eq!(
            d.destination_uri(Path::new("/tmp/rhythmbox_sync")),
            "file:///tmp/rhythmbox_sync/Road Trip.m3u"
        );
    }

    #[test]
    fn test_skip_list_is_honored() {
        let mut player = ScriptedPlayer::new(["A", "Recently Added", "B"]);
        let report =
            export_playlists(&mut player, Path::new("/tmp/ws"), &settings(&["Recently Added"]))
                .unwrap();

        assert_eq!(player.exported_names(), vec!["A", "B"]);
        assert!(player.exports.iter().all(|(_, _, m3u)| *m3u));
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(!report.halted);
    }

    #[test]
    fn test_no_reply_recovers_and_continues() {
        let mut player = ScriptedPlayer::new(["A", "B"]).fail_next("A", no_reply());
        let report = export_playlists(&mut player, Path::new("/tmp/ws"), &settings(&[])).unwrap();

        assert_eq!(player.exported_names(), vec!["A", "B"]);
        assert_eq!(player.ensure_running_calls, 1);
        assert_eq!(player.reconnect_calls, 1);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].1, ExportOutcome::FailedTransient(no_reply()));
        assert_eq!(report.entries[1].1, ExportOutcome::Succeeded);
        assert!(!report.halted);
    }

    #[test]
    fn test_other_failure_halts_phase() {
        let fatal = PlayerError::rpc("org.gnome.Rhythmbox3.Error.Failed", "unknown playlist");
        let mut player = ScriptedPlayer::new(["A", "B"]).fail_next("A", fatal.clone());
        let report = export_playlists(&mut player, Path::new("/tmp/ws"), &settings(&[])).unwrap();

        assert_eq!(player.exported_names(), vec!["A"]);
        assert_eq!(player.ensure_running_calls, 0);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].0.name, "A");
        assert_eq!(report.entries[0].1, ExportOutcome::FailedFatal(fatal));
        assert!(report.halted);
    }

    #[test]
    fn test_listing_failure_is_err() {
        let mut player =
            ScriptedPlayer::new(["A"]).fail_listing(PlayerError::Unavailable("no bus".into()));
        assert!(export_playlists(&mut player, Path::new("/tmp/ws"), &settings(&[])).is_err());
        assert!(player.exports.is_empty());
    }
}
