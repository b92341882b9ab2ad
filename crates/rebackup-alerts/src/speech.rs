//! Speech engine port and the external-program backend

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::debug;

use crate::{find_program, AlertError};

/// Port trait for speaking a line of text
pub trait ISpeechEngine: Send + Sync {
    /// Speaks `text` and blocks until speech has finished
    fn speak(&self, text: &str) -> Result<(), AlertError>;
}

/// Text-to-speech programs tried in order by [`CommandSpeechEngine::detect`].
/// `spd-say` returns before speaking unless given `-w`.
const KNOWN_ENGINES: &[(&str, &[&str])] = &[
    ("espeak-ng", &[]),
    ("espeak", &[]),
    ("spd-say", &["-w"]),
    ("say", &[]),
];

/// Speaks text by running an external TTS program with the text as its last
/// argument
#[derive(Debug, Clone)]
pub struct CommandSpeechEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSpeechEngine {
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an engine for a named program, adding the usual flags when the
    /// program is a known one
    pub fn for_program(name: &str) -> Self {
        let stem = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);
        let args = KNOWN_ENGINES
            .iter()
            .find(|(known, _)| *known == stem)
            .map(|(_, args)| args.to_vec())
            .unwrap_or_default();
        Self::new(name, args)
    }

    /// Finds the first known TTS program installed on this host
    pub fn detect() -> Option<Self> {
        KNOWN_ENGINES.iter().find_map(|(name, args)| {
            find_program(name).map(|path| {
                debug!(engine = %path.display(), "Detected speech engine");
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

impl ISpeechEngine for CommandSpeechEngine {
    fn speak(&self, text: &str) -> Result<(), AlertError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                AlertError::SpeechFailed(format!("cannot start {}: {e}", self.program.display()))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(AlertError::SpeechFailed(format!(
                "{} exited with {status}",
                self.program.display()
            )))
        }
    }
}
