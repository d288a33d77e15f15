//! Config module - Manages rbsync configuration (rbsync.toml).
//!
//! The file is deserialized into [`Config`], which mirrors the TOML layout and
//! keeps most fields optional. [`Settings::from_config`] validates it once and
//! produces the immutable value every component receives.

use crate::error::ConfigError;
use crate::translate::{BasePathSet, PathTranslator};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const RHYTHMDB_FILE: &str = "rhythmdb.xml";
pub const PLAYLISTS_FILE: &str = "playlists.xml";

const DEFAULT_MEDIA_CATEGORIES: [&str; 3] = ["Music", "Audiobooks", "Podcasts"];
const LIBRARY_SUBDIR: &str = ".local/share/rhythmbox";
const COVER_ART_SUBDIR: &str = ".cache/rhythmbox/covers";

/// Local machine: where the library and media live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Library owner; paths default to `/home/<user>/...`
    #[serde(default)]
    pub user: Option<String>,
    /// Media category directories (default: Music, Audiobooks, Podcasts in home)
    #[serde(default)]
    pub media_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub library_dir: Option<PathBuf>,
    #[serde(default)]
    pub cover_art_dir: Option<PathBuf>,
    /// Scratch directory for exported and rewritten artifacts
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
}

fn default_workspace() -> PathBuf {
    PathBuf::from("/tmp/rhythmbox_sync")
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            user: None,
            media_dirs: Vec::new(),
            library_dir: None,
            cover_art_dir: None,
            workspace: default_workspace(),
        }
    }
}

/// How mirror jobs reach the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MirrorBackend {
    /// rsync over ssh (passwordless auth assumed)
    #[default]
    Rsync,
    /// Remote paths are reachable on this machine (e.g. a mounted share)
    Local,
}

/// Remote machine: destination prefixes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub media_dir: Option<String>,
    #[serde(default)]
    pub playlists_dir: Option<String>,
    #[serde(default)]
    pub library_dir: Option<String>,
    #[serde(default)]
    pub cover_art_dir: Option<String>,
    #[serde(default)]
    pub backend: MirrorBackend,
}

/// Playlist export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_skip_playlists")]
    pub skip_playlists: Vec<String>,
    /// Rhythmbox is not ready right after `rhythmbox-client` returns
    #[serde(default = "default_startup_wait")]
    pub startup_wait_secs: u64,
    #[serde(default = "default_shutdown_wait")]
    pub shutdown_wait_secs: u64,
}

fn default_format() -> String {
    "m3u".to_string()
}

fn default_skip_playlists() -> Vec<String> {
    vec!["Recently Added".to_string(), "Recently Played".to_string()]
}

fn default_startup_wait() -> u64 {
    10
}

fn default_shutdown_wait() -> u64 {
    3
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            skip_playlists: default_skip_playlists(),
            startup_wait_secs: default_startup_wait(),
            shutdown_wait_secs: default_shutdown_wait(),
        }
    }
}

/// Which phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSwitches {
    #[serde(default = "enabled")]
    pub export: bool,
    #[serde(default)]
    pub sync_library: bool,
    #[serde(default = "enabled")]
    pub sync_media: bool,
    #[serde(default = "enabled")]
    pub sync_playlists: bool,
    /// Log mirror commands without running them
    #[serde(default = "enabled")]
    pub dry_run: bool,
    #[serde(default)]
    pub keep_workspace: bool,
}

fn enabled() -> bool {
    true
}

impl Default for PhaseSwitches {
    fn default() -> Self {
        Self {
            export: true,
            sync_library: false,
            sync_media: true,
            sync_playlists: true,
            dry_run: true,
            keep_workspace: false,
        }
    }
}

/// Main rbsync configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub phases: PhaseSwitches,
}

/// Get default config directory (~/.config/rbsync/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("rbsync"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("rbsync.toml")
}

impl Config {
    /// Load config from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        Ok(())
    }
}

/// Serialization scheme for exported playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistFormat {
    M3u,
}

impl PlaylistFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::M3u => "m3u",
        }
    }

    /// Value of the `ExportPlaylist` m3u flag.
    pub fn is_m3u(&self) -> bool {
        matches!(self, Self::M3u)
    }
}

impl FromStr for PlaylistFormat {
    type Err = ConfigError;

    // PLS would need Rhythmbox's own URI quoting, which we can't reproduce.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m3u" => Ok(Self::M3u),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for PlaylistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Destination prefixes on the remote machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub user: Option<String>,
    pub host: Option<String>,
    pub media_dir: String,
    pub playlists_dir: String,
    pub library_dir: String,
    pub cover_art_dir: String,
    pub backend: MirrorBackend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub format: PlaylistFormat,
    pub skip_playlists: Vec<String>,
    pub startup_wait: Duration,
    pub shutdown_wait: Duration,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub media_dirs: Vec<PathBuf>,
    pub base_paths: BasePathSet,
    pub library_dir: PathBuf,
    pub cover_art_dir: PathBuf,
    pub workspace: PathBuf,
    pub remote: RemoteTarget,
    pub export: ExportSettings,
    pub phases: PhaseSwitches,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let format: PlaylistFormat = config.export.format.parse()?;

        let local_home = match &config.local.user {
            Some(user) => Some(PathBuf::from("/home").join(user)),
            None => dirs::home_dir(),
        };
        let from_local_home = |sub: &str| local_home.as_ref().map(|h| h.join(sub));

        let media_dirs = if config.local.media_dirs.is_empty() {
            let home = local_home.as_ref().ok_or(ConfigError::NoMediaDirs)?;
            DEFAULT_MEDIA_CATEGORIES.iter().map(|c| home.join(c)).collect()
        } else {
            config.local.media_dirs.clone()
        };
        for dir in &media_dirs {
            require_absolute("local.media_dirs", dir)?;
        }

        let library_dir = config
            .local
            .library_dir
            .clone()
            .or_else(|| from_local_home(LIBRARY_SUBDIR))
            .ok_or(ConfigError::MissingPath("local.library_dir"))?;
        let cover_art_dir = config
            .local
            .cover_art_dir
            .clone()
            .or_else(|| from_local_home(COVER_ART_SUBDIR))
            .ok_or(ConfigError::MissingPath("local.cover_art_dir"))?;
        require_absolute("local.library_dir", &library_dir)?;
        require_absolute("local.cover_art_dir", &cover_art_dir)?;
        require_absolute("local.workspace", &config.local.workspace)?;

        let remote = resolve_remote(&config.remote)?;

        // The parent of each media dir is what gets replaced, so that
        // `<base>/Music/x` lands at `<remote media>/Music/x` after rsync.
        let base_paths = BasePathSet::new(media_dirs.iter().map(|dir| {
            dir.parent()
                .unwrap_or(dir.as_path())
                .to_string_lossy()
                .into_owned()
        }))?;

        Ok(Self {
            media_dirs,
            base_paths,
            library_dir,
            cover_art_dir,
            workspace: config.local.workspace.clone(),
            remote,
            export: ExportSettings {
                format,
                skip_playlists: config.export.skip_playlists.clone(),
                startup_wait: Duration::from_secs(config.export.startup_wait_secs),
                shutdown_wait: Duration::from_secs(config.export.shutdown_wait_secs),
            },
            phases: config.phases,
        })
    }

    /// Translator from local base paths to the remote media prefix.
    pub fn translator(&self) -> PathTranslator {
        PathTranslator::new(self.base_paths.clone(), self.remote.media_dir.clone())
    }
}

fn resolve_remote(remote: &RemoteConfig) -> Result<RemoteTarget, ConfigError> {
    if remote.backend == MirrorBackend::Rsync
        && remote.host.as_deref().map_or(true, |h| h.trim().is_empty())
    {
        return Err(ConfigError::MissingRemoteHost);
    }

    let remote_home = remote.user.as_ref().map(|u| format!("/home/{}", u));
    let under_home = |sub: &str| remote_home.as_ref().map(|h| format!("{}/{}", h, sub));

    let media_dir = remote
        .media_dir
        .clone()
        .ok_or(ConfigError::MissingPath("remote.media_dir"))?;
    let playlists_dir = remote
        .playlists_dir
        .clone()
        .ok_or(ConfigError::MissingPath("remote.playlists_dir"))?;
    let library_dir = remote
        .library_dir
        .clone()
        .or_else(|| under_home(LIBRARY_SUBDIR))
        .ok_or(ConfigError::MissingPath("remote.library_dir"))?;
    let cover_art_dir = remote
        .cover_art_dir
        .clone()
        .or_else(|| under_home(COVER_ART_SUBDIR))
        .ok_or(ConfigError::MissingPath("remote.cover_art_dir"))?;

    for (field, value) in [
        ("remote.media_dir", &media_dir),
        ("remote.playlists_dir", &playlists_dir),
        ("remote.library_dir", &library_dir),
        ("remote.cover_art_dir", &cover_art_dir),
    ] {
        require_absolute(field, Path::new(value))?;
    }

    Ok(RemoteTarget {
        user: remote.user.clone(),
        host: remote.host.clone(),
        media_dir,
        playlists_dir,
        library_dir,
        cover_art_dir,
        backend: remote.backend,
    })
}

fn require_absolute(field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath(field));
    }
    if !path.is_absolute() {
        return Err(ConfigError::RelativePath {
            field,
            value: path.display().to_string(),
        });
    }
    Ok(())
}
