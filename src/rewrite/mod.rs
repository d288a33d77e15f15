//! Rewrite module - Produce remote-path copies of local artifacts.
//!
//! Sources are never modified; every procedure reads one file and writes a
//! new one.

pub mod database;
pub mod playlist;

pub use database::{rewrite_document, rewrite_document_file, DocumentKind};
pub use playlist::{discover_playlists, rewrite_playlist, rewrite_playlist_file};

use crate::translate::RewriteResult;
use std::ops::AddAssign;
use tracing::error;

/// Counts for one rewritten artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub rewritten: usize,
    pub unmatched: usize,
    /// Values that are not translated at all (comments, non-file URIs).
    pub passed_through: usize,
}

impl RewriteStats {
    /// Count a translation and log it if nothing matched.
    fn record(&mut self, result: &RewriteResult) {
        match result {
            RewriteResult::Rewritten { .. } => self.rewritten += 1,
            RewriteResult::Unmatched { original } => {
                self.unmatched += 1;
                error!(
                    "[Rewrite] Couldn't figure out how to modify file location for remote use: {}",
                    original.trim_end()
                );
            }
        }
    }
}

impl AddAssign for RewriteStats {
    fn add_assign(&mut self, other: Self) {
        self.rewritten += other.rewritten;
        self.unmatched += other.unmatched;
        self.passed_through += other.passed_through;
    }
}
