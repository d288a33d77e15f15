use crate::error::MirrorError;
use crate::sync::mirror::{ChmodPolicy, Mirror, MirrorJob, MirrorReport, MirrorSource};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Local file system mirror.
/// Remote paths are resolved under `root` (e.g. a mounted share, or `/`).
pub struct LocalMirror {
    root: PathBuf,
}

#[derive(Default)]
struct Counts {
    copied: usize,
    deleted: usize,
}

impl LocalMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }

    /// Make `dst` an exact copy of `src`, deleting extra entries.
    fn sync_tree(
        src: &Path,
        dst: &Path,
        chmod: Option<ChmodPolicy>,
        counts: &mut Counts,
    ) -> Result<(), MirrorError> {
        if dst.is_file() {
            fs::remove_file(dst)?;
            counts.deleted += 1;
        }
        fs::create_dir_all(dst)?;
        apply_mode(dst, chmod.map(|c| c.dir_mode))?;

        let mut seen: HashSet<OsString> = HashSet::new();
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            let name = entry.file_name();
            let src_path = entry.path();
            let dst_path = dst.join(&name);
            seen.insert(name);

            if src_path.is_dir() {
                Self::sync_tree(&src_path, &dst_path, chmod, counts)?;
            } else {
                Self::sync_file(&src_path, &dst_path, chmod, counts)?;
            }
        }

        for entry in fs::read_dir(dst)? {
            let entry = entry?;
            if seen.contains(&entry.file_name()) {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            counts.deleted += 1;
        }
        Ok(())
    }

    /// Copy when size or modification time differ; keeps the source mtime.
    fn sync_file(
        src: &Path,
        dst: &Path,
        chmod: Option<ChmodPolicy>,
        counts: &mut Counts,
    ) -> Result<(), MirrorError> {
        if dst.is_dir() {
            fs::remove_dir_all(dst)?;
            counts.deleted += 1;
        }

        let src_meta = fs::metadata(src)?;
        let should_copy = match fs::metadata(dst) {
            Ok(dst_meta) => {
                src_meta.len() != dst_meta.len() || src_meta.modified()? != dst_meta.modified()?
            }
            Err(_) => true,
        };

        if should_copy {
            fs::copy(src, dst)?;
            let file = fs::File::open(dst)?;
            file.set_modified(src_meta.modified()?)?;
            counts.copied += 1;
        }
        apply_mode(dst, chmod.map(|c| c.file_mode))?;
        Ok(())
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<(), MirrorError> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<(), MirrorError> {
    Ok(())
}

impl Mirror for LocalMirror {
    fn name(&self) -> &'static str {
        "local"
    }

    fn describe(&self, job: &MirrorJob) -> Result<String, MirrorError> {
        job.ensure_sources()?;
        let source = match &job.source {
            MirrorSource::Directory(dir) => dir.display().to_string(),
            MirrorSource::Contents(dir) => format!("{}/", dir.display()),
            MirrorSource::Files(files) => files
                .iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>()
                .join(" "),
        };
        Ok(format!(
            "mirror {} -> {}",
            source,
            self.resolve(&job.destination).display()
        ))
    }

    fn mirror(&mut self, job: &MirrorJob) -> Result<MirrorReport, MirrorError> {
        job.ensure_sources()?;
        let started = Instant::now();
        let dest = self.resolve(&job.destination);
        info!("[Local] Mirroring {} to {:?}", job.label, dest);

        let mut counts = Counts::default();
        match &job.source {
            MirrorSource::Directory(dir) => {
                let name = dir
                    .file_name()
                    .ok_or_else(|| MirrorError::NoSources(job.label.clone()))?;
                fs::create_dir_all(&dest)?;
                Self::sync_tree(dir, &dest.join(name), job.chmod, &mut counts)?;
            }
            MirrorSource::Contents(dir) => {
                Self::sync_tree(dir, &dest, job.chmod, &mut counts)?;
            }
            MirrorSource::Files(files) => {
                fs::create_dir_all(&dest)?;
                for file in files {
                    let name = file
                        .file_name()
                        .ok_or_else(|| MirrorError::NoSources(job.label.clone()))?;
                    Self::sync_file(file, &dest.join(name), job.chmod, &mut counts)?;
                }
            }
        }

        Ok(MirrorReport {
            elapsed: started.elapsed(),
            files_copied: Some(counts.copied),
            files_deleted: Some(counts.deleted),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(dir.join("Artist/Album"))?;
        fs::write(dir.join("Artist/Album/01.mp3"), "one")?;
        fs::write(dir.join("Artist/Album/02.mp3"), "two")?;
        fs::write(dir.join("cover.jpg"), "jpg")?;
        Ok(())
    }

    #[test]
    fn test_directory_lands_under_its_name() -> Result<(), Box<dyn std::error::Error>> {
        let src = TempDir::new()?;
        let remote = TempDir::new()?;
        let music = src.path().join("Music");
        populate(&music)?;

        let mut mirror = LocalMirror::new(remote.path());
        let job = MirrorJob::new("media", MirrorSource::Directory(music), "/srv/media/");
        let report = mirror.mirror(&job)?;

        assert_eq!(report.files_copied, Some(3));
        assert_eq!(
            fs::read_to_string(remote.path().join("srv/media/Music/Artist/Album/02.mp3"))?,
            "two"
        );
        Ok(())
    }

    #[test]
    fn test_second_run_is_noop_and_extras_are_deleted() -> Result<(), Box<dyn std::error::Error>> {
        let src = TempDir::new()?;
        let remote = TempDir::new()?;
        populate(src.path())?;

        let mut mirror = LocalMirror::new(remote.path());
        let job = MirrorJob::new("covers", MirrorSource::Contents(src.path().into()), "/covers");
        mirror.mirror(&job)?;

        let second = mirror.mirror(&job)?;
        assert_eq!(second.files_copied, Some(0));
        assert_eq!(second.files_deleted, Some(0));

        fs::remove_file(src.path().join("Artist/Album/01.mp3"))?;
        fs::write(remote.path().join("covers/stray.txt"), "x")?;
        let third = mirror.mirror(&job)?;
        assert_eq!(third.files_deleted, Some(2));
        assert!(!remote.path().join("covers/Artist/Album/01.mp3").exists());
        assert!(!remote.path().join("covers/stray.txt").exists());
        assert!(remote.path().join("covers/cover.jpg").exists());
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_chmod_policy_applied() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;
        let src = TempDir::new()?;
        let remote = TempDir::new()?;
        let music = src.path().join("Music");
        populate(&music)?;
        fs::set_permissions(music.join("cover.jpg"), fs::Permissions::from_mode(0o600))?;

        let job = MirrorJob::new("media", MirrorSource::Directory(music), "/m")
            .with_chmod(ChmodPolicy::media());
        LocalMirror::new(remote.path()).mirror(&job)?;

        let file_mode = fs::metadata(remote.path().join("m/Music/cover.jpg"))?.permissions().mode();
        let dir_mode = fs::metadata(remote.path().join("m/Music/Artist"))?.permissions().mode();
        assert_eq!(file_mode & 0o777, 0o644);
        assert_eq!(dir_mode & 0o777, 0o755);
        Ok(())
    }
}
