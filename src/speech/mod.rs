//! Prompt/listen adapter: one round of "speak a prompt, capture one answer".
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                PromptListener (trait)                   │
//! │                                                        │
//! │  VoicePrompter                     ConsolePrompter      │
//! │   ├─ Speaker (CommandSpeaker)       ├─ BufRead input    │
//! │   ├─ UtteranceSource (Microphone)   ├─ Write output     │
//! │   └─ SttEngine (WhisperEngine)      └─ Speaker          │
//! │                                                        │
//! │            ─▶ Transcript { Text | Unknown | Error | Timeout }
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The session only ever sees the four-way [`Transcript`].

pub mod console;
pub mod prompter;
pub mod speaker;
pub mod transcript;

pub use console::ConsolePrompter;
pub use prompter::{PromptListener, VoicePrompter};
pub use speaker::{speaker_from_config, CommandSpeaker, SilentSpeaker, SpeakError, Speaker};
pub use transcript::Transcript;

#[cfg(test)]
pub use prompter::ScriptedPrompter;
