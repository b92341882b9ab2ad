//! In-process playback through `rodio`
//!
//! The output stream and sink are opened per call and dropped when `play`
//! returns, so the audio device is only held while a sound is playing.

use std::{fs::File, io::BufReader, path::Path, time::Duration};

use rodio::{Decoder, OutputStream, Sink};
use tokio_util::sync::CancellationToken;

use crate::{player::ISoundPlayer, AlertError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Decodes and plays sounds on the default output device
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl ISoundPlayer for RodioPlayer {
    fn play(&self, path: &Path, cancel: &CancellationToken) -> Result<(), AlertError> {
        let failed = |reason: String| AlertError::PlaybackFailed {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|_| AlertError::SoundNotFound(path.to_path_buf()))?;
        let (_stream, handle) = OutputStream::try_default().map_err(|e| failed(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| failed(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| failed(e.to_string()))?;

        sink.append(source);
        while !sink.empty() {
            if cancel.is_cancelled() {
                sink.stop();
                return Err(AlertError::Cancelled);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }
}
