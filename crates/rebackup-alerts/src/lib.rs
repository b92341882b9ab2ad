//! rebackup Alerts - Sound and text-to-speech notifications
//!
//! Provides:
//! - [`NotificationController`] - Success/warning/error sounds with a custom
//!   override looked up by base-name, falling back to the default sound
//! - Background playback with a bounded settle wait ([`AlertTask`])
//! - Blocking text-to-speech for spoken alerts
//! - [`LogOnlyAlerts`] for hosts without audio
//!
//! ## Modules
//!
//! - [`controller`] - Alert policy (override, fallback, background playback)
//! - [`player`] - Sound player port and the external-program backend
//! - [`speech`] - Speech engine port and the external-program backend
//! - [`task`] - Handle to an in-flight alert sound
//! - `native` - In-process `rodio` backend (feature `native-audio`)

pub mod controller;
pub mod log_only;
#[cfg(feature = "native-audio")]
pub mod native;
pub mod player;
pub mod speech;
pub mod task;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use controller::{AlertSound, AlertSounds, NotificationController};
pub use log_only::LogOnlyAlerts;
#[cfg(feature = "native-audio")]
pub use native::RodioPlayer;
pub use player::{CommandPlayer, ISoundPlayer};
pub use speech::{CommandSpeechEngine, ISpeechEngine};
pub use task::AlertTask;

/// Errors from sound playback and speech backends
///
/// These never escape the [`NotificationController`]; it turns them into a
/// `false` playback result or a log line.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The sound file does not exist or is not a regular file
    #[error("Sound file not found: {0}")]
    SoundNotFound(PathBuf),

    /// The backend could not play the file
    #[error("Playback of {path} failed: {reason}")]
    PlaybackFailed { path: PathBuf, reason: String },

    /// The text-to-speech engine failed
    #[error("Speech failed: {0}")]
    SpeechFailed(String),

    /// Playback was stopped by shutdown
    #[error("Playback cancelled")]
    Cancelled,

    /// No player or speech program is available on this host
    #[error("No {0} backend available")]
    NoBackend(&'static str),
}

/// Placeholder backend used when no player or speech program was found
///
/// Every call fails with [`AlertError::NoBackend`], which the controller
/// logs and otherwise ignores.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackend;

impl ISoundPlayer for NoBackend {
    fn play(
        &self,
        _path: &Path,
        _cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<(), AlertError> {
        Err(AlertError::NoBackend("sound player"))
    }
}

impl ISpeechEngine for NoBackend {
    fn speak(&self, _text: &str) -> Result<(), AlertError> {
        Err(AlertError::NoBackend("speech"))
    }
}

/// Resolves `name` to an executable path
///
/// A name containing a path separator is checked as-is; a bare name is
/// searched for in `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}
