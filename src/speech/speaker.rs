//! Text-to-speech output.
//!
//! [`CommandSpeaker`] shells out to a platform TTS program (`say` on macOS,
//! `espeak` on Linux) and blocks until playback has finished, so the speaker
//! is idle before the microphone opens for the next answer.

use std::process::Command;

use thiserror::Error;

use crate::config::SpeechConfig;

/// Errors from a single speak call.  Callers treat all of them as non-fatal.
#[derive(Debug, Error)]
pub enum SpeakError {
    #[error("cannot speak empty text")]
    EmptyText,

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: String },
}

/// Blocking text-to-speech output.
pub trait Speaker {
    /// Speak `text` and return once playback has finished.
    fn speak(&self, text: &str) -> Result<(), SpeakError>;
}

impl<S: Speaker + ?Sized> Speaker for Box<S> {
    fn speak(&self, text: &str) -> Result<(), SpeakError> {
        (**self).speak(text)
    }
}

// ---------------------------------------------------------------------------
// CommandSpeaker
// ---------------------------------------------------------------------------

/// Runs `program [args..] <text>` for every utterance.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeakError> {
        if text.trim().is_empty() {
            return Err(SpeakError::EmptyText);
        }

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .map_err(|source| SpeakError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SpeakError::Exit {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SilentSpeaker
// ---------------------------------------------------------------------------

/// Speech output disabled: prompts are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeakError> {
        log::info!("(speech disabled) {text}");
        Ok(())
    }
}

/// Build the speaker selected by `config`.
pub fn speaker_from_config(config: &SpeechConfig) -> Box<dyn Speaker> {
    if config.enabled {
        Box::new(CommandSpeaker::from_config(config))
    } else {
        Box::new(SilentSpeaker)
    }
}
