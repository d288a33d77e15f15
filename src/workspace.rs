//! Scratch workspace owned by one run.
//!
//! Nothing locks the directory: two runs against the same workspace are not
//! supported and must be prevented by whoever starts them.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const REWRITTEN_DIR: &str = "rewritten";

#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    /// Create the directory if it doesn't exist yet. Existing content is kept.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            info!("[Workspace] Creating directory for local export: {}", root.display());
            fs::create_dir_all(&root)
                .with_context(|| format!("Cannot create workspace {}", root.display()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where rewritten playlists go; created on first use.
    pub fn rewritten_dir(&self) -> Result<PathBuf> {
        let dir = self.root.join(REWRITTEN_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create {}", dir.display()))?;
        Ok(dir)
    }

    /// Delete the workspace unless `keep` is set. Returns whether it was removed.
    pub fn finish(self, keep: bool) -> Result<bool> {
        if keep {
            info!("[Workspace] Keeping {}", self.root.display());
            return Ok(false);
        }
        info!("[Workspace] Removing folder used for local export");
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("Cannot remove workspace {}", self.root.display()))?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_and_finish_removes() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().join("scratch");

        let ws = ScratchWorkspace::open(&root)?;
        assert!(root.is_dir());
        let rewritten = ws.rewritten_dir()?;
        fs::write(rewritten.join("a.m3u"), "x")?;

        assert!(ws.finish(false)?);
        assert!(!root.exists());
        Ok(())
    }

    #[test]
    fn test_keep_retains_stale_files() -> Result<()> {
        let temp = TempDir::new()?;
        let ws = ScratchWorkspace::open(temp.path())?;
        fs::write(ws.root().join("old.m3u"), "x")?;
        assert!(!ws.finish(true)?);

        let reopened = ScratchWorkspace::open(temp.path())?;
        assert!(reopened.root().join("old.m3u").exists());
        Ok(())
    }
}
