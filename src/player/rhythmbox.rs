use crate::error::PlayerError;
use crate::player::PlayerControl;
use crate::process::{self, CommandLine, ProcessOutput};
use tracing::{debug, info, warn};

const BUS_NAME: &str = "org.gnome.Rhythmbox3";
const OBJECT_PATH: &str = "/org/gnome/Rhythmbox3/PlaylistManager";
const INTERFACE: &str = "org.gnome.Rhythmbox3.PlaylistManager";

/// Milliseconds dbus-send waits for a reply before reporting `NoReply`.
const REPLY_TIMEOUT_MS: u32 = 25_000;

/// Rhythmbox adapter.
/// Wraps the `dbus-send` and `rhythmbox-client` command line tools.
pub struct Rhythmbox {
    dbus_send: String,
    client: String,
    reply_timeout_ms: u32,
}

impl Rhythmbox {
    pub fn new() -> Self {
        Self {
            dbus_send: "dbus-send".to_string(),
            client: "rhythmbox-client".to_string(),
            reply_timeout_ms: REPLY_TIMEOUT_MS,
        }
    }

    fn method_call(&self, method: &str) -> CommandLine {
        CommandLine::new(&self.dbus_send)
            .arg("--session")
            .arg("--print-reply")
            .arg(format!("--reply-timeout={}", self.reply_timeout_ms))
            .arg(format!("--dest={}", BUS_NAME))
            .arg(OBJECT_PATH)
            .arg(method)
    }

    fn call(&self, command: &CommandLine) -> Result<ProcessOutput, PlayerError> {
        debug!("[Rhythmbox] {}", command);
        let output =
            process::run(command).map_err(|e| PlayerError::Unavailable(format!("{:#}", e)))?;
        if output.success() {
            Ok(output)
        } else {
            Err(parse_dbus_error(&output.stderr))
        }
    }

    fn run_client(&self, flag: &str) {
        let command = CommandLine::new(&self.client).arg(flag);
        match process::run(&command) {
            Ok(output) if output.success() => {
                debug!("[Rhythmbox] `{}` took {:?}", command, output.elapsed)
            }
            Ok(output) => warn!(
                "[Rhythmbox] `{}` exited with {:?}: {}",
                command,
                output.code,
                output.stderr.trim()
            ),
            Err(e) => warn!("[Rhythmbox] {:#}", e),
        }
    }
}

impl Default for Rhythmbox {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerControl for Rhythmbox {
    fn list_playlists(&mut self) -> Result<Vec<String>, PlayerError> {
        let command = self.method_call(&format!("{}.GetPlaylists", INTERFACE));
        let output = self.call(&command)?;
        Ok(parse_string_array(&output.stdout))
    }

    fn export_playlist(
        &mut self,
        name: &str,
        destination_uri: &str,
        as_m3u: bool,
    ) -> Result<(), PlayerError> {
        let command = self
            .method_call(&format!("{}.ExportPlaylist", INTERFACE))
            .arg(format!("string:{}", name))
            .arg(format!("string:{}", destination_uri))
            .arg(format!("boolean:{}", as_m3u));
        self.call(&command).map(|_| ())
    }

    fn reconnect(&mut self) -> Result<(), PlayerError> {
        let command = self.method_call("org.freedesktop.DBus.Peer.Ping");
        self.call(&command).map(|_| ())
    }

    fn ensure_running(&mut self) {
        info!("[Rhythmbox] Making sure Rhythmbox is running");
        self.run_client("--check-running");
    }

    fn request_quit(&mut self) {
        info!("[Rhythmbox] Asking Rhythmbox to quit");
        self.run_client("--quit");
    }
}

/// `dbus-send` prints `Error <name>: <message>` on stderr.
fn parse_dbus_error(stderr: &str) -> PlayerError {
    let line = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    match line.strip_prefix("Error ") {
        Some(rest) => match rest.split_once(':') {
            Some((reason, message)) => PlayerError::rpc(reason.trim(), message.trim()),
            None => PlayerError::rpc(rest.trim(), ""),
        },
        None => PlayerError::Unavailable(format!("unexpected dbus-send output: {}", line)),
    }
}

/// Pull the values out of a `--print-reply` `array [ string "..." ... ]`.
fn parse_string_array(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            line.trim()
                .strip_prefix("string \"")
                .and_then(|rest| rest.strip_suffix('"'))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlists_reply() {
        let stdout = "method return time=1700000000.1 sender=:1.83 -> destination=:1.99 serial=412 reply_serial=2\n   array [\n      string \"Play Queue\"\n      string \"My \"Top\" Rated\"\n      string \"Recently Added\"\n   ]\n";
        assert_eq!(
            parse_string_array(stdout),
            vec!["Play Queue", "My \"Top\" Rated", "Recently Added"]
        );
    }

    #[test]
    fn test_parse_no_reply_error() {
        let err = parse_dbus_error(
            "Error org.freedesktop.DBus.Error.NoReply: Did not receive a reply. Possible causes include: the remote application did not send a reply\n",
        );
        assert!(err.is_transient());
        assert_eq!(err.reason(), Some("org.freedesktop.DBus.Error.NoReply"));
    }

    #[test]
    fn test_parse_unknown_output() {
        let err = parse_dbus_error("Segmentation fault\n");
        assert!(matches!(err, PlayerError::Unavailable(_)));
    }

    #[test]
    fn test_export_command_shape() {
        let rb = Rhythmbox::new();
        let cmd = rb
            .method_call("org.gnome.Rhythmbox3.PlaylistManager.ExportPlaylist")
            .arg("string:Road Trip");
        assert_eq!(cmd.program, "dbus-send");
        assert_eq!(cmd.args[3], "--dest=org.gnome.Rhythmbox3");
        assert_eq!(cmd.args[4], OBJECT_PATH);
        assert_eq!(cmd.args.last().map(String::as_str), Some("string:Road Trip"));
    }
}
