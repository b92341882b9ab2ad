//! Sound player port and the external-program backend
//!
//! [`ISoundPlayer::play`] is blocking: it returns once the sound has finished,
//! failed, or been cancelled. Callers run it on a blocking thread.
//!
//! Each call owns its audio resource for exactly the duration of the call.
//! For [`CommandPlayer`] that resource is the child process, which is always
//! reaped before `play` returns, so a failed call never leaves the device
//! held for the next one.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Duration,
};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{find_program, AlertError};

/// Port trait for playing a sound file to completion
pub trait ISoundPlayer: Send + Sync {
    /// Plays `path` and blocks until playback ends
    ///
    /// Implementations poll `cancel` while waiting and stop playback when it
    /// is cancelled.
    fn play(&self, path: &Path, cancel: &CancellationToken) -> Result<(), AlertError>;
}

/// How often a running player is checked for completion
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Players tried in order by [`CommandPlayer::detect`], with the arguments
/// that make each one play a file once without a window or console output.
const KNOWN_PLAYERS: &[(&str, &[&str])] = &[
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("mpv", &["--no-video", "--really-quiet"]),
    ("mpg123", &["-q"]),
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("afplay", &[]),
];

// ============================================================================
// CommandPlayer
// ============================================================================

/// Plays sounds by running an external player program
///
/// The sound path is passed as the last argument.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: PathBuf,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandPlayer {
    /// Creates a player that runs `program args... <sound>`
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Creates a player for a named program, using the usual flags when the
    /// program is one of the known players
    pub fn for_program(name: &str) -> Self {
        let stem = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);
        let args = KNOWN_PLAYERS
            .iter()
            .find(|(known, _)| *known == stem)
            .map(|(_, args)| args.to_vec())
            .unwrap_or_default();
        Self::new(name, args)
    }

    /// Finds the first known player installed on this host
    pub fn detect() -> Option<Self> {
        KNOWN_PLAYERS.iter().find_map(|(name, args)| {
            find_program(name).map(|path| {
                debug!(player = %path.display(), "Detected sound player");
                Self::new(path, args.iter().copied())
            })
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl ISoundPlayer for CommandPlayer {
    fn play(&self, path: &Path, cancel: &CancellationToken) -> Result<(), AlertError> {
        if !path.is_file() {
            return Err(AlertError::SoundNotFound(path.to_path_buf()));
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AlertError::PlaybackFailed {
                path: path.to_path_buf(),
                reason: format!("cannot start {}: {e}", self.program.display()),
            })?;

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(AlertError::PlaybackFailed {
                        path: path.to_path_buf(),
                        reason: format!("{} exited with {status}", self.program.display()),
                    })
                }
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(AlertError::PlaybackFailed {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }

            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AlertError::Cancelled);
            }

            std::thread::sleep(self.poll_interval);
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
