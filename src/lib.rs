//! rbsync Core Library
//!
//! Mirrors a Rhythmbox library to a machine whose media lives under a
//! different base path. Provides the following capabilities:
//! - Export playlists from a running Rhythmbox over D-Bus
//! - Rewrite local file locations in `rhythmdb.xml`, `playlists.xml` and M3U files
//! - Mirror the rewritten artifacts, cover art and media with rsync
//!
//! Pipeline: Export (player) -> Rewrite (paths) -> Mirror (remote)

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod player;
pub mod process;
pub mod rewrite;
pub mod sync;
pub mod translate;
pub mod workspace;

// Re-export main types
pub use config::{Config, PlaylistFormat, RemoteTarget, Settings};
pub use error::{ConfigError, MirrorError, PlayerError};
pub use orchestrator::{MirrorRecord, MirrorStatus, Orchestrator, Phase, RunReport};
pub use player::{ExportOutcome, ExportReport, PlayerControl, PlaylistDescriptor, Rhythmbox};
pub use rewrite::RewriteStats;
pub use sync::{LocalMirror, Mirror, MirrorJob, MirrorSource, RsyncMirror};
pub use translate::{BasePathSet, PathTranslator, RewriteResult};
pub use workspace::ScratchWorkspace;
