//! STT (speech-to-text) engine.
//!
//! ```rust,no_run
//! use truck_inspect::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-base.en.bin", TranscribeParams::default())
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM from the audio module
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! println!("{}", engine.transcribe(&audio).unwrap());
//! ```

pub mod engine;
pub mod transcribe;

pub use engine::{SttEngine, SttError, WhisperEngine};
pub use transcribe::{SamplingStrategy, TranscribeParams};

#[cfg(test)]
pub use engine::MockSttEngine;
