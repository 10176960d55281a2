//! Audio input: microphone capture → 16 kHz mono → utterance endpointing.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix → StreamResampler
//!           → UtteranceDetector (calibrate / wait / capture) → Utterance
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use truck_inspect::audio::{ListenWindow, Microphone, Utterance, UtteranceSource};
//!
//! let mut mic = Microphone::open(None).unwrap();
//! match mic.record_utterance(&ListenWindow::default()).unwrap() {
//!     Utterance::Speech(samples) => println!("captured {} samples", samples.len()),
//!     Utterance::NoSpeech => println!("nobody spoke"),
//! }
//! ```

pub mod capture;
pub mod convert;
pub mod endpoint;

pub use capture::{AudioChunk, CaptureError, Microphone, UtteranceSource};
pub use convert::{downmix, ConvertError, StreamResampler, TARGET_RATE};
pub use endpoint::{rms, ListenWindow, Utterance, UtteranceDetector};
