use crate::config::RemoteTarget;
use crate::error::MirrorError;
use crate::process::{self, CommandLine};
use crate::sync::mirror::{ChmodPolicy, Mirror, MirrorJob, MirrorReport, MirrorSource};
use tracing::{debug, info, warn};

/// Recursive, links, perms, times, group, compressed, verbose.
const ARCHIVE_FLAGS: &str = "-vrlptgz";

/// Rsync mirror backend.
/// Wraps the rsync command line tool over ssh.
pub struct RsyncMirror {
    rsync_path: String,
    user: Option<String>,
    host: String,
}

impl RsyncMirror {
    pub fn new(user: Option<String>, host: impl Into<String>) -> Self {
        Self {
            rsync_path: "rsync".to_string(),
            user,
            host: host.into(),
        }
    }

    /// Backend for the configured remote, `None` when no host is set.
    pub fn for_target(remote: &RemoteTarget) -> Option<Self> {
        remote
            .host
            .as_ref()
            .map(|host| Self::new(remote.user.clone(), host.clone()))
    }

    fn remote_spec(&self, path: &str) -> String {
        match &self.user {
            Some(user) => format!("{}@{}:{}", user, self.host, path),
            None => format!("{}:{}", self.host, path),
        }
    }

    /// Compose the full rsync invocation for `job`.
    pub fn command(&self, job: &MirrorJob) -> Result<CommandLine, MirrorError> {
        job.ensure_sources()?;

        let mut cmd = CommandLine::new(&self.rsync_path).arg(ARCHIVE_FLAGS);
        if let Some(chmod) = job.chmod {
            cmd = cmd.arg(format!("--chmod={}", chmod_spec(chmod)));
        }
        cmd = cmd.args(["-e", "ssh"]);

        cmd = match &job.source {
            MirrorSource::Directory(dir) => {
                let dir = dir.to_string_lossy();
                let trimmed = match dir.trim_end_matches('/') {
                    "" => "/",
                    t => t,
                };
                cmd.arg(trimmed)
            }
            MirrorSource::Contents(dir) => {
                let dir = dir.to_string_lossy();
                cmd.arg(format!("{}/", dir.trim_end_matches('/')))
            }
            MirrorSource::Files(files) => {
                cmd.args(files.iter().map(|f| f.to_string_lossy().into_owned()))
            }
        };

        Ok(cmd
            .arg(self.remote_spec(&job.destination))
            .arg("--delete-excluded"))
    }
}

impl Mirror for RsyncMirror {
    fn name(&self) -> &'static str {
        "rsync"
    }

    fn describe(&self, job: &MirrorJob) -> Result<String, MirrorError> {
        Ok(self.command(job)?.to_string())
    }

    fn mirror(&mut self, job: &MirrorJob) -> Result<MirrorReport, MirrorError> {
        let cmd = self.command(job)?;
        info!("[Rsync] Executing: {}", cmd);

        let output = process::run(&cmd).map_err(|e| MirrorError::Spawn(format!("{:#}", e)))?;
        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[Rsync] {}", line);
        }

        if !output.success() {
            warn!("[Rsync] {}", output.stderr.trim());
            return Err(MirrorError::ExitStatus {
                command: cmd.to_string(),
                code: output.code,
            });
        }

        Ok(MirrorReport {
            elapsed: output.elapsed,
            files_copied: None,
            files_deleted: None,
        })
    }
}

/// `--chmod` value, e.g. `Du=rwx,Dg=rx,Do=rx,Fu=rw,Fg=r,Fo=r`.
fn chmod_spec(policy: ChmodPolicy) -> String {
    let mut parts = Vec::with_capacity(6);
    for (kind, mode) in [('D', policy.dir_mode), ('F', policy.file_mode)] {
        for (class, shift) in [('u', 6), ('g', 3), ('o', 0)] {
            let bits = (mode >> shift) & 0o7;
            let mut perms = String::new();
            for (bit, letter) in [(0o4, 'r'), (0o2, 'w'), (0o1, 'x')] {
                if bits & bit != 0 {
                    perms.push(letter);
                }
            }
            parts.push(format!("{}{}={}", kind, class, perms));
        }
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn mirror() -> RsyncMirror {
        RsyncMirror::new(Some("kyle".into()), "192.168.1.15")
    }

    #[test]
    fn test_media_chmod_spec() {
        assert_eq!(
            chmod_spec(ChmodPolicy::media()),
            "Du=rwx,Dg=rx,Do=rx,Fu=rw,Fg=r,Fo=r"
        );
    }

    #[test]
    fn test_media_command() {
        let job = MirrorJob::new(
            "media",
            MirrorSource::Directory("/home/jessica/Music".into()),
            "/media/storage/Music/Jess/",
        )
        .with_chmod(ChmodPolicy::media());
        assert_eq!(
            mirror().describe(&job).unwrap(),
            "rsync -vrlptgz --chmod=Du=rwx,Dg=rx,Do=rx,Fu=rw,Fg=r,Fo=r -e ssh /home/jessica/Music kyle@192.168.1.15:/media/storage/Music/Jess/ --delete-excluded"
        );
    }

    #[test]
    fn test_contents_command_has_trailing_slash() {
        let job = MirrorJob::new(
            "cover art",
            MirrorSource::Contents("/home/jessica/.cache/rhythmbox/covers/".into()),
            "/home/kyle/.cache/rhythmbox/covers",
        );
        let cmd = mirror().command(&job).unwrap();
        assert_eq!(
            cmd.args,
            vec![
                "-vrlptgz",
                "-e",
                "ssh",
                "/home/jessica/.cache/rhythmbox/covers/",
                "kyle@192.168.1.15:/home/kyle/.cache/rhythmbox/covers",
                "--delete-excluded",
            ]
        );
    }

    #[test]
    fn test_files_command_lists_each_file() {
        let job = MirrorJob::new(
            "playlists",
            MirrorSource::Files(vec![
                PathBuf::from("/tmp/ws/rewritten/A.m3u"),
                PathBuf::from("/tmp/ws/rewritten/B.m3u"),
            ]),
            "/srv/playlists",
        );
        let cmd = RsyncMirror::new(None, "nas").command(&job).unwrap();
        assert_eq!(&cmd.args[3..5], ["/tmp/ws/rewritten/A.m3u", "/tmp/ws/rewritten/B.m3u"]);
        assert_eq!(cmd.args[5], "nas:/srv/playlists");
    }

    #[test]
    fn test_empty_file_list_is_no_sources() {
        let job = MirrorJob::new("playlists", MirrorSource::Files(vec![]), "/srv/playlists");
        assert!(matches!(
            mirror().command(&job),
            Err(MirrorError::NoSources(label)) if label == "playlists"
        ));
    }
}
