//! Player module - Control surface of the running media player.
//!
//! This module contains:
//! - PlayerControl trait for abstraction
//! - Rhythmbox adapter (D-Bus via `dbus-send`, lifecycle via `rhythmbox-client`)
//! - ScriptedPlayer, a deterministic double for tests
//! - The playlist export state machine

pub mod export;
pub mod rhythmbox;
pub mod scripted;

pub use export::{export_playlists, ExportOutcome, ExportReport, PlaylistDescriptor};
pub use rhythmbox::Rhythmbox;
pub use scripted::ScriptedPlayer;

use crate::error::PlayerError;

/// Everything the pipeline needs from the player.
///
/// Lifecycle calls are best-effort: implementations log their own failures
/// and callers never branch on them.
pub trait PlayerControl {
    /// Names of all playlists known to the player.
    fn list_playlists(&mut self) -> Result<Vec<String>, PlayerError>;

    /// Ask the player to write `name` to `destination_uri`.
    fn export_playlist(
        &mut self,
        name: &str,
        destination_uri: &str,
        as_m3u: bool,
    ) -> Result<(), PlayerError>;

    /// Re-acquire the control surface after a restart.
    fn reconnect(&mut self) -> Result<(), PlayerError>;

    /// Start the player if it isn't running.
    fn ensure_running(&mut self);

    /// Ask the player to exit.
    fn request_quit(&mut self);
}
