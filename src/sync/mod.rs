//! Sync module - Mirror local trees to the remote machine.
//!
//! This module contains:
//! - Mirror trait for abstraction
//! - Rsync backend (rsync over ssh)
//! - Local backend (remote paths reachable on this machine)

pub mod local;
pub mod mirror;
pub mod rsync;

pub use local::LocalMirror;
pub use mirror::{ChmodPolicy, Mirror, MirrorJob, MirrorReport, MirrorSource};
pub use rsync::RsyncMirror;
