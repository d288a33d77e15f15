use crate::error::PlayerError;
use crate::player::PlayerControl;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;

/// Deterministic player double.
///
/// Playlists export successfully unless a failure has been queued for them
/// with [`ScriptedPlayer::fail_next`]. Every call is recorded so tests can
/// assert on order and counts.
#[derive(Debug, Default)]
pub struct ScriptedPlayer {
    playlists: Vec<String>,
    failures: HashMap<String, VecDeque<PlayerError>>,
    list_failure: Option<PlayerError>,
    contents: HashMap<String, String>,
    write_files: bool,
    pub exports: Vec<(String, String, bool)>,
    pub ensure_running_calls: usize,
    pub reconnect_calls: usize,
    pub quit_calls: usize,
}

impl ScriptedPlayer {
    pub fn new<I, S>(playlists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            playlists: playlists.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Queue a failure for the next export of `name`.
    pub fn fail_next(mut self, name: &str, error: PlayerError) -> Self {
        self.failures
            .entry(name.to_string())
            .or_default()
            .push_back(error);
        self
    }

    /// Make `list_playlists` fail.
    pub fn fail_listing(mut self, error: PlayerError) -> Self {
        self.list_failure = Some(error);
        self
    }

    /// On success, write `body` to the `file://` destination like the real player.
    pub fn with_contents(mut self, name: &str, body: &str) -> Self {
        self.write_files = true;
        self.contents.insert(name.to_string(), body.to_string());
        self
    }

    /// Names that reached `export_playlist`, in call order.
    pub fn exported_names(&self) -> Vec<&str> {
        self.exports.iter().map(|(n, _, _)| n.as_str()).collect()
    }
}

impl PlayerControl for ScriptedPlayer {
    fn list_playlists(&mut self) -> Result<Vec<String>, PlayerError> {
        match &self.list_failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.playlists.clone()),
        }
    }

    fn export_playlist(
        &mut self,
        name: &str,
        destination_uri: &str,
        as_m3u: bool,
    ) -> Result<(), PlayerError> {
        self.exports
            .push((name.to_string(), destination_uri.to_string(), as_m3u));

        if let Some(err) = self.failures.get_mut(name).and_then(VecDeque::pop_front) {
            return Err(err);
        }

        if self.write_files {
            if let Some(path) = destination_uri.strip_prefix("file://") {
                let body = self.contents.get(name).map(String::as_str).unwrap_or("#EXTM3U\n");
                fs::write(PathBuf::from(path), body)
                    .map_err(|e| PlayerError::Unavailable(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), PlayerError> {
        self.reconnect_calls += 1;
        Ok(())
    }

    fn ensure_running(&mut self) {
        self.ensure_running_calls += 1;
    }

    fn request_quit(&mut self) {
        self.quit_calls += 1;
    }
}
