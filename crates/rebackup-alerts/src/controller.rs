//! Notification controller
//!
//! Each alert level has a default sound and a custom override with the same
//! base-name, looked up in the working directory (or a configured override
//! directory). The override is tried first; the default plays only if the
//! override could not be played.
//!
//! ## Playback
//!
//! ```text
//! alert_error() ──spawn_blocking──→ play(custom) ──fail──→ play(default)
//!      │
//!      └── waits ≤ settle_delay, then returns AlertTask
//! ```
//!
//! Sounds overlap freely; nothing is queued. Cancelling the shutdown token
//! stops every in-flight sound at the backend's next poll.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use rebackup_core::{
    config::AlertsConfig,
    ports::alerts::{AlertLevel, IAlertService},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{player::ISoundPlayer, speech::ISpeechEngine, task::AlertTask, AlertError};

/// Default time an alert call waits for its sound
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// AlertSound / AlertSounds
// ============================================================================

/// Custom override and default path for one alert level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSound {
    custom: PathBuf,
    default: PathBuf,
}

impl AlertSound {
    /// Derives the override path from the base-name of `default`
    ///
    /// With no `custom_dir` the override is the bare base-name, resolved
    /// against the working directory when played.
    pub fn new(default: impl Into<PathBuf>, custom_dir: Option<&Path>) -> Self {
        let default = default.into();
        let base = default
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| default.clone());
        let custom = match custom_dir {
            Some(dir) => dir.join(base),
            None => base,
        };
        Self { custom, default }
    }

    pub fn custom(&self) -> &Path {
        &self.custom
    }

    pub fn default_path(&self) -> &Path {
        &self.default
    }
}

/// Sounds for all three alert levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSounds {
    pub success: AlertSound,
    pub warning: AlertSound,
    pub error: AlertSound,
}

impl AlertSounds {
    pub fn get(&self, level: AlertLevel) -> &AlertSound {
        match level {
            AlertLevel::Success => &self.success,
            AlertLevel::Warning => &self.warning,
            AlertLevel::Error => &self.error,
        }
    }

    fn with_custom_dir(&self, dir: Option<&Path>) -> Self {
        Self {
            success: AlertSound::new(self.success.default.clone(), dir),
            warning: AlertSound::new(self.warning.default.clone(), dir),
            error: AlertSound::new(self.error.default.clone(), dir),
        }
    }
}

// ============================================================================
// NotificationController
// ============================================================================

/// Plays alert sounds and speaks alert messages
pub struct NotificationController {
    sounds: AlertSounds,
    player: Arc<dyn ISoundPlayer>,
    speech: Arc<dyn ISpeechEngine>,
    settle_delay: Duration,
    shutdown: CancellationToken,
}

impl NotificationController {
    /// Creates a controller with overrides looked up in the working directory
    ///
    /// # Arguments
    /// * `default_success` - Sound played for success alerts
    /// * `default_error` - Sound played for error alerts
    /// * `default_warning` - Sound played for warning alerts
    /// * `player` - Backend that plays sound files
    /// * `speech` - Backend that speaks text
    pub fn new(
        default_success: impl Into<PathBuf>,
        default_error: impl Into<PathBuf>,
        default_warning: impl Into<PathBuf>,
        player: Arc<dyn ISoundPlayer>,
        speech: Arc<dyn ISpeechEngine>,
    ) -> Self {
        Self {
            sounds: AlertSounds {
                success: AlertSound::new(default_success, None),
                warning: AlertSound::new(default_warning, None),
                error: AlertSound::new(default_error, None),
            },
            player,
            speech,
            settle_delay: DEFAULT_SETTLE_DELAY,
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a controller from the `alerts` config section
    pub fn from_config(
        config: &AlertsConfig,
        player: Arc<dyn ISoundPlayer>,
        speech: Arc<dyn ISpeechEngine>,
        shutdown: CancellationToken,
    ) -> Self {
        let controller = Self::new(
            config.success_sound.clone(),
            config.error_sound.clone(),
            config.warning_sound.clone(),
            player,
            speech,
        )
        .with_settle_delay(config.settle_delay())
        .with_shutdown(shutdown);

        match &config.custom_sound_dir {
            Some(dir) => controller.with_custom_sound_dir(dir),
            None => controller,
        }
    }

    /// Looks for override sounds in `dir` instead of the working directory
    pub fn with_custom_sound_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.sounds = self.sounds.with_custom_dir(Some(dir.as_ref()));
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Ties in-flight playback to `shutdown`
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn sounds(&self) -> &AlertSounds {
        &self.sounds
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    // ========================================================================
    // Sounds
    // ========================================================================

    /// Plays `path` to completion on the calling thread
    ///
    /// Returns `false` on any failure instead of raising it. Blocking; call
    /// from a blocking context.
    pub fn play_sound(&self, path: &Path) -> bool {
        match self.player.play(path, &self.shutdown) {
            Ok(()) => true,
            Err(e) => {
                warn!(sound = %path.display(), error = %e, "Failed to play sound");
                false
            }
        }
    }

    pub async fn alert_success(&self) -> AlertTask {
        self.alert(AlertLevel::Success).await
    }

    pub async fn alert_warning(&self) -> AlertTask {
        self.alert(AlertLevel::Warning).await
    }

    pub async fn alert_error(&self) -> AlertTask {
        self.alert(AlertLevel::Error).await
    }

    /// Starts the sound for `level` in the background
    ///
    /// Returns once the sound has finished or the settle delay has passed,
    /// whichever is first. The returned task may be dropped to leave the
    /// sound playing.
    pub async fn alert(&self, level: AlertLevel) -> AlertTask {
        let sound = self.sounds.get(level).clone();
        let player = Arc::clone(&self.player);
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();

        debug!(%level, sound = %sound.custom().display(), "Raising alert");
        let mut task = AlertTask::spawn(level, cancel, move || {
            play_alert_sound(player.as_ref(), &sound, &token)
        });
        task.wait_for(self.settle_delay).await;
        task
    }

    // ========================================================================
    // Speech
    // ========================================================================

    /// Speaks `text` and returns once it has been spoken
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn alert_msg(&self, text: &str) {
        let speech = Arc::clone(&self.speech);
        let owned = text.to_owned();

        match tokio::task::spawn_blocking(move || speech.speak(&owned)).await {
            Ok(Ok(())) => debug!(text, "Alert message spoken"),
            Ok(Err(e)) => warn!(text, error = %e, "Failed to speak alert message"),
            Err(e) => warn!(text, error = %e, "Speech task failed"),
        }
    }
}

/// Plays the override, then the default if the override failed
fn play_alert_sound(
    player: &dyn ISoundPlayer,
    sound: &AlertSound,
    cancel: &CancellationToken,
) -> bool {
    match player.play(sound.custom(), cancel) {
        Ok(()) => return true,
        Err(AlertError::Cancelled) => return false,
        Err(AlertError::SoundNotFound(_)) => {
            debug!(sound = %sound.custom().display(), "No custom sound, using default");
        }
        Err(e) => {
            info!(
                sound = %sound.custom().display(),
                error = %e,
                "Custom sound failed, using default"
            );
        }
    }

    if sound.custom() == sound.default_path() || cancel.is_cancelled() {
        return false;
    }

    match player.play(sound.default_path(), cancel) {
        Ok(()) => true,
        Err(AlertError::Cancelled) => false,
        Err(e) => {
            warn!(
                sound = %sound.default_path().display(),
                error = %e,
                "Failed to play alert sound"
            );
            false
        }
    }
}

#[async_trait::async_trait]
impl IAlertService for NotificationController {
    async fn raise(&self, level: AlertLevel) {
        let task = self.alert(level).await;
        if task.outcome() == Some(false) {
            warn!(%level, "Alert sound could not be played");
        }
    }

    async fn speak(&self, message: &str) {
        self.alert_msg(message).await;
    }
}

// ============================================================================
// Unit tests
// ============================================================================
