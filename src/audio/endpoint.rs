//! Ambient calibration and utterance endpointing.
//!
//! [`UtteranceDetector`] is fed 16 kHz mono samples as they arrive and
//! decides where one spoken answer begins and ends:
//!
//! ```text
//! Calibrating ── calibration_secs of audio ──▶ Waiting
//!   threshold = max(min_energy, ambient_rms × energy_ratio)
//! Waiting ── frame RMS > threshold ──▶ Capturing
//!         ── timeout_secs without speech ──▶ NoSpeech
//! Capturing ── trailing_silence_secs quiet ──▶ Speech(audio)
//!           ── phrase_limit_secs captured ──▶ Speech(audio)
//! ```
//!
//! Audio is processed in 30 ms frames (480 samples).  Time is derived from
//! the number of samples seen, so the detector is fully deterministic.

use std::collections::VecDeque;

use crate::config::ListenConfig;

use super::convert::TARGET_RATE;

/// 30 ms at 16 kHz.
const FRAME_SIZE: usize = 480;

/// Frames kept from before speech onset so the first syllable is not clipped.
const PREROLL_FRAMES: usize = 10;

/// Root-mean-square amplitude of a frame.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_sq = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// ListenWindow
// ---------------------------------------------------------------------------

/// Fixed bounds for capturing one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenWindow {
    /// Ambient-noise calibration period before listening starts.
    pub calibration_secs: f32,
    /// Maximum wait for speech to begin.
    pub timeout_secs: f32,
    /// Maximum length of one answer.
    pub phrase_limit_secs: f32,
    /// Quiet time that ends an answer.
    pub trailing_silence_secs: f32,
    /// Speech threshold as a multiple of the ambient RMS.
    pub energy_ratio: f32,
    /// Lower bound for the speech threshold.
    pub min_energy: f32,
}

impl ListenWindow {
    fn frames(secs: f32) -> usize {
        let samples = (secs.max(0.0) * TARGET_RATE as f32) as usize;
        (samples + FRAME_SIZE - 1) / FRAME_SIZE
    }

    /// Upper bound on wall-clock seconds one capture can take.
    pub fn max_total_secs(&self) -> f32 {
        self.calibration_secs + self.timeout_secs + self.phrase_limit_secs
    }
}

impl Default for ListenWindow {
    fn default() -> Self {
        Self::from(&ListenConfig::default())
    }
}

impl From<&ListenConfig> for ListenWindow {
    fn from(config: &ListenConfig) -> Self {
        Self {
            calibration_secs: config.calibration_secs,
            timeout_secs: config.timeout_secs,
            phrase_limit_secs: config.phrase_limit_secs,
            trailing_silence_secs: config.trailing_silence_secs,
            energy_ratio: config.energy_ratio,
            min_energy: config.min_energy,
        }
    }
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// Result of one capture.
#[derive(Debug, Clone, PartialEq)]
pub enum Utterance {
    /// 16 kHz mono samples of the answer.
    Speech(Vec<f32>),
    /// Nothing was said within the listen window.
    NoSpeech,
}

// ---------------------------------------------------------------------------
// UtteranceDetector
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Phase {
    Calibrating { frames: usize, energy: f32 },
    Waiting { frames: usize, preroll: VecDeque<Vec<f32>> },
    Capturing { audio: Vec<f32>, frames: usize, quiet: usize },
    Done,
}

/// Incremental endpoint detector for one answer.
#[derive(Debug)]
pub struct UtteranceDetector {
    calibration_frames: usize,
    timeout_frames: usize,
    phrase_frames: usize,
    trailing_frames: usize,
    energy_ratio: f32,
    min_energy: f32,
    threshold: f32,
    carry: Vec<f32>,
    phase: Phase,
}

impl UtteranceDetector {
    pub fn new(window: &ListenWindow) -> Self {
        let calibration_frames = ListenWindow::frames(window.calibration_secs);
        let phase = if calibration_frames == 0 {
            Phase::Waiting {
                frames: 0,
                preroll: VecDeque::new(),
            }
        } else {
            Phase::Calibrating {
                frames: 0,
                energy: 0.0,
            }
        };
        Self {
            calibration_frames,
            timeout_frames: ListenWindow::frames(window.timeout_secs).max(1),
            phrase_frames: ListenWindow::frames(window.phrase_limit_secs).max(1),
            trailing_frames: ListenWindow::frames(window.trailing_silence_secs).max(1),
            energy_ratio: window.energy_ratio,
            min_energy: window.min_energy,
            threshold: window.min_energy,
            carry: Vec::with_capacity(FRAME_SIZE),
            phase,
        }
    }

    /// Speech threshold in use (final once calibration is over).
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed samples; returns the utterance once it is complete.
    pub fn push(&mut self, samples: &[f32]) -> Option<Utterance> {
        for &sample in samples {
            self.carry.push(sample);
            if self.carry.len() == FRAME_SIZE {
                let frame = std::mem::replace(&mut self.carry, Vec::with_capacity(FRAME_SIZE));
                if let Some(done) = self.on_frame(frame) {
                    return Some(done);
                }
            }
        }
        None
    }

    /// Close the detector when the input ends early.
    pub fn finish(mut self) -> Utterance {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Capturing { mut audio, .. } => {
                audio.extend_from_slice(&self.carry);
                Utterance::Speech(audio)
            }
            _ => Utterance::NoSpeech,
        }
    }

    fn on_frame(&mut self, frame: Vec<f32>) -> Option<Utterance> {
        let level = rms(&frame);
        match &mut self.phase {
            Phase::Calibrating { frames, energy } => {
                *frames += 1;
                *energy += level;
                if *frames >= self.calibration_frames {
                    let ambient = *energy / *frames as f32;
                    self.threshold = (ambient * self.energy_ratio).max(self.min_energy);
                    log::debug!(
                        "listen: ambient rms {ambient:.4}, speech threshold {:.4}",
                        self.threshold
                    );
                    self.phase = Phase::Waiting {
                        frames: 0,
                        preroll: VecDeque::new(),
                    };
                }
                None
            }
            Phase::Waiting { frames, preroll } => {
                *frames += 1;
                if level > self.threshold {
                    let mut audio: Vec<f32> = preroll.drain(..).flatten().collect();
                    audio.extend_from_slice(&frame);
                    self.phase = Phase::Capturing {
                        audio,
                        frames: 1,
                        quiet: 0,
                    };
                    return self.check_capture_limits();
                }
                if *frames >= self.timeout_frames {
                    self.phase = Phase::Done;
                    return Some(Utterance::NoSpeech);
                }
                preroll.push_back(frame);
                if preroll.len() > PREROLL_FRAMES {
                    preroll.pop_front();
                }
                None
            }
            Phase::Capturing {
                audio,
                frames,
                quiet,
            } => {
                audio.extend_from_slice(&frame);
                *frames += 1;
                if level > self.threshold {
                    *quiet = 0;
                } else {
                    *quiet += 1;
                }
                self.check_capture_limits()
            }
            Phase::Done => None,
        }
    }

    fn check_capture_limits(&mut self) -> Option<Utterance> {
        let finished = match &self.phase {
            Phase::Capturing { frames, quiet, .. } => {
                *quiet >= self.trailing_frames || *frames >= self.phrase_frames
            }
            _ => false,
        };
        if !finished {
            return None;
        }
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Capturing { audio, .. } => Some(Utterance::Speech(audio)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> ListenWindow {
        ListenWindow {
            calibration_secs: 0.3,      // 10 frames
            timeout_secs: 0.6,          // 20 frames
            phrase_limit_secs: 1.5,     // 50 frames
            trailing_silence_secs: 0.3, // 10 frames
            energy_ratio: 1.5,
            min_energy: 0.01,
        }
    }

    fn frames(level: f32, count: usize) -> Vec<f32> {
        vec![level; FRAME_SIZE * count]
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&[0.5; 16]) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn calibration_raises_threshold_above_ambient() {
        let mut det = UtteranceDetector::new(&window());
        assert!(det.push(&frames(0.1, 10)).is_none());
        assert!((det.threshold() - 0.15).abs() < 1e-4);
    }

    #[test]
    fn quiet_room_uses_minimum_threshold() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 10));
        assert!((det.threshold() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn silence_after_calibration_times_out() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 10));
        assert!(det.push(&frames(0.0, 19)).is_none());
        assert_eq!(det.push(&frames(0.0, 1)), Some(Utterance::NoSpeech));
    }

    #[test]
    fn speech_ends_on_trailing_silence() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 10));
        det.push(&frames(0.0, 2)); // preroll
        assert!(det.push(&frames(0.5, 5)).is_none());
        match det.push(&frames(0.0, 10)) {
            Some(Utterance::Speech(audio)) => {
                // 2 preroll + 5 voiced + 10 trailing frames
                assert_eq!(audio.len(), FRAME_SIZE * 17);
            }
            other => panic!("expected speech, got {other:?}"),
        }
    }

    #[test]
    fn phrase_limit_cuts_long_answers() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 10));
        match det.push(&frames(0.5, 80)) {
            Some(Utterance::Speech(audio)) => assert_eq!(audio.len(), FRAME_SIZE * 50),
            other => panic!("expected speech, got {other:?}"),
        }
    }

    #[test]
    fn preroll_is_bounded() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 10));
        det.push(&frames(0.001, 15));
        match det.push(&frames(0.5, 50)) {
            Some(Utterance::Speech(audio)) => {
                assert_eq!(audio.len(), FRAME_SIZE * (PREROLL_FRAMES + 50));
            }
            other => panic!("expected speech, got {other:?}"),
        }
    }

    #[test]
    fn finish_mid_capture_returns_partial_speech() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 10));
        det.push(&frames(0.5, 3));
        det.push(&[0.5; 100]);
        match det.finish() {
            Utterance::Speech(audio) => assert_eq!(audio.len(), FRAME_SIZE * 3 + 100),
            other => panic!("expected speech, got {other:?}"),
        }
    }

    #[test]
    fn finish_before_speech_is_no_speech() {
        let mut det = UtteranceDetector::new(&window());
        det.push(&frames(0.0, 12));
        assert_eq!(det.finish(), Utterance::NoSpeech);
    }

    #[test]
    fn zero_calibration_starts_waiting_immediately() {
        let mut w = window();
        w.calibration_secs = 0.0;
        let mut det = UtteranceDetector::new(&w);
        assert!(det.push(&frames(0.5, 1)).is_none());
        assert!(matches!(det.push(&frames(0.0, 10)), Some(Utterance::Speech(_))));
    }
}
