//! [`PromptListener`], the contract the session consumes, and the
//! microphone-backed [`VoicePrompter`].
//!
//! # One round
//!
//! ```text
//! speak(prompt)            failure → warn, keep going
//!   └─▶ record_utterance   calibrate → wait for onset → capture
//!         ├─ NoSpeech      → Timeout
//!         ├─ capture error → Error
//!         └─ Speech(audio)
//!               └─▶ stt.transcribe
//!                     ├─ Ok(blank) / AudioTooShort → Unknown
//!                     ├─ Err(_)                    → Error
//!                     └─ Ok(text)                  → Text(text)
//! ```
//!
//! The microphone stream is opened and dropped inside `record_utterance`;
//! nothing is held across question boundaries.

use std::sync::Arc;

use crate::audio::{ListenWindow, Utterance, UtteranceSource};
use crate::stt::{SttEngine, SttError};

use super::speaker::Speaker;
use super::transcript::Transcript;

// ---------------------------------------------------------------------------
// PromptListener
// ---------------------------------------------------------------------------

/// Speak a prompt, capture one spoken answer.
///
/// Implementations never fail: every problem is folded into one of the
/// [`Transcript`] sentinels, and speech-output failures are only logged.
pub trait PromptListener {
    /// Speak `prompt` and return what the operator answered.
    fn prompt_and_listen(&mut self, prompt: &str) -> Transcript;

    /// Speak `text` without listening (apologies, confirmations).
    fn say(&mut self, text: &str);
}

impl<P: PromptListener + ?Sized> PromptListener for Box<P> {
    fn prompt_and_listen(&mut self, prompt: &str) -> Transcript {
        (**self).prompt_and_listen(prompt)
    }

    fn say(&mut self, text: &str) {
        (**self).say(text)
    }
}

// ---------------------------------------------------------------------------
// VoicePrompter
// ---------------------------------------------------------------------------

/// Speaker + microphone + STT engine.
pub struct VoicePrompter<S, M> {
    speaker: S,
    microphone: M,
    stt: Arc<dyn SttEngine>,
    window: ListenWindow,
}

impl<S: Speaker, M: UtteranceSource> VoicePrompter<S, M> {
    pub fn new(speaker: S, microphone: M, stt: Arc<dyn SttEngine>, window: ListenWindow) -> Self {
        Self {
            speaker,
            microphone,
            stt,
            window,
        }
    }

    fn listen(&mut self) -> Transcript {
        let audio = match self.microphone.record_utterance(&self.window) {
            Ok(Utterance::Speech(audio)) => audio,
            Ok(Utterance::NoSpeech) => {
                log::info!("Listening timed out. Please try again.");
                return Transcript::Timeout;
            }
            Err(e) => {
                log::error!("microphone capture failed: {e}");
                return Transcript::Error;
            }
        };

        match self.stt.transcribe(&audio) {
            Ok(text) if text.trim().is_empty() => {
                log::info!("Sorry, I didn't catch that.");
                Transcript::Unknown
            }
            Ok(text) => {
                log::debug!("You said: '{text}'");
                Transcript::Text(text)
            }
            Err(SttError::AudioTooShort) => {
                log::info!("Sorry, I didn't catch that.");
                Transcript::Unknown
            }
            Err(e) => {
                log::warn!("speech recognition failed: {e}");
                Transcript::Error
            }
        }
    }
}

impl<S: Speaker, M: UtteranceSource> PromptListener for VoicePrompter<S, M> {
    fn prompt_and_listen(&mut self, prompt: &str) -> Transcript {
        self.say(prompt);
        log::info!("Listening for: '{prompt}'");
        self.listen()
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = self.speaker.speak(text) {
            log::warn!("Error in text-to-speech: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompter  (test-only)
// ---------------------------------------------------------------------------

/// Replays a fixed list of transcripts and records everything it was asked
/// to speak.  Once the script runs out every round returns `Timeout`.
#[cfg(test)]
pub struct ScriptedPrompter {
    script: std::collections::VecDeque<Transcript>,
    pub prompts: Vec<String>,
    pub spoken: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(script: impl IntoIterator<Item = Transcript>) -> Self {
        Self {
            script: script.into_iter().collect(),
            prompts: Vec::new(),
            spoken: Vec::new(),
        }
    }

    /// Script where every answer succeeds first time.
    pub fn answering<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(answers.into_iter().map(|a| Transcript::Text(a.to_string())))
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[cfg(test)]
impl PromptListener for ScriptedPrompter {
    fn prompt_and_listen(&mut self, prompt: &str) -> Transcript {
        self.prompts.push(prompt.to_string());
        self.script.pop_front().unwrap_or(Transcript::Timeout)
    }

    fn say(&mut self, text: &str) {
        self.spoken.push(text.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::CaptureError;
    use crate::speech::speaker::SpeakError;
    use crate::stt::MockSttEngine;

    /// Records what was spoken; optionally fails every call.
    #[derive(Clone, Default)]
    struct RecordingSpeaker {
        said: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str) -> Result<(), SpeakError> {
            self.said.borrow_mut().push(text.to_string());
            if self.fail {
                Err(SpeakError::EmptyText)
            } else {
                Ok(())
            }
        }
    }

    /// Hands out pre-built capture results.
    struct FakeMicrophone(Vec<Result<Utterance, CaptureError>>);

    impl UtteranceSource for FakeMicrophone {
        fn record_utterance(&mut self, _window: &ListenWindow) -> Result<Utterance, CaptureError> {
            if self.0.is_empty() {
                Ok(Utterance::NoSpeech)
            } else {
                self.0.remove(0)
            }
        }
    }

    fn one_second_of_speech() -> Utterance {
        Utterance::Speech(vec![0.2_f32; 16_000])
    }

    fn prompter(
        speaker: RecordingSpeaker,
        mic: Vec<Result<Utterance, CaptureError>>,
        stt: MockSttEngine,
    ) -> VoicePrompter<RecordingSpeaker, FakeMicrophone> {
        VoicePrompter::new(
            speaker,
            FakeMicrophone(mic),
            Arc::new(stt),
            ListenWindow::default(),
        )
    }

    #[test]
    fn recognised_speech_becomes_text() {
        let speaker = RecordingSpeaker::default();
        let mut p = prompter(
            speaker.clone(),
            vec![Ok(one_second_of_speech())],
            MockSttEngine::ok("SN1"),
        );
        assert_eq!(
            p.prompt_and_listen("Please provide the Truck Serial Number."),
            Transcript::Text("SN1".into())
        );
        assert_eq!(
            speaker.said.borrow().as_slice(),
            ["Please provide the Truck Serial Number."]
        );
    }

    #[test]
    fn no_speech_is_timeout() {
        let mut p = prompter(
            RecordingSpeaker::default(),
            vec![Ok(Utterance::NoSpeech)],
            MockSttEngine::ok("never"),
        );
        assert_eq!(p.prompt_and_listen("?"), Transcript::Timeout);
    }

    #[test]
    fn capture_failure_is_error() {
        let mut p = prompter(
            RecordingSpeaker::default(),
            vec![Err(CaptureError::NoDevice)],
            MockSttEngine::ok("never"),
        );
        assert_eq!(p.prompt_and_listen("?"), Transcript::Error);
    }

    #[test]
    fn blank_transcription_is_unknown() {
        let mut p = prompter(
            RecordingSpeaker::default(),
            vec![Ok(one_second_of_speech())],
            MockSttEngine::ok("   "),
        );
        assert_eq!(p.prompt_and_listen("?"), Transcript::Unknown);
    }

    #[test]
    fn too_short_audio_is_unknown() {
        let mut p = prompter(
            RecordingSpeaker::default(),
            vec![Ok(Utterance::Speech(vec![0.2; 100]))],
            MockSttEngine::ok("never"),
        );
        assert_eq!(p.prompt_and_listen("?"), Transcript::Unknown);
    }

    #[test]
    fn engine_failure_is_error() {
        let mut p = prompter(
            RecordingSpeaker::default(),
            vec![Ok(one_second_of_speech())],
            MockSttEngine::err(SttError::Transcription("boom".into())),
        );
        assert_eq!(p.prompt_and_listen("?"), Transcript::Error);
    }

    #[test]
    fn speech_output_failure_does_not_block_listening() {
        let speaker = RecordingSpeaker {
            fail: true,
            ..RecordingSpeaker::default()
        };
        let mut p = prompter(
            speaker,
            vec![Ok(one_second_of_speech())],
            MockSttEngine::ok("Volvo"),
        );
        assert_eq!(p.prompt_and_listen("Model?"), Transcript::Text("Volvo".into()));
    }

    #[test]
    fn scripted_prompter_replays_then_times_out() {
        let mut p = ScriptedPrompter::new([Transcript::Unknown, Transcript::Text("a".into())]);
        assert_eq!(p.prompt_and_listen("one"), Transcript::Unknown);
        assert_eq!(p.prompt_and_listen("two"), Transcript::Text("a".into()));
        assert_eq!(p.prompt_and_listen("three"), Transcript::Timeout);
        assert_eq!(p.prompts, vec!["one", "two", "three"]);
        assert_eq!(p.remaining(), 0);
    }
}
