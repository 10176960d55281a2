//! Microphone capture via `cpal`.
//!
//! [`Microphone`] holds only the device and its stream configuration.  Each
//! call to [`UtteranceSource::record_utterance`] builds a fresh input stream,
//! downmixes every buffer, resamples the stream to 16 kHz, feeds the
//! [`UtteranceDetector`] until it reports an end point, and drops the stream
//! before returning, so the device is released between questions.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::convert::{downmix, ConvertError, StreamResampler};
use super::endpoint::{ListenWindow, Utterance, UtteranceDetector};

/// Grace period on top of the listen window before a silent device is
/// treated as stalled.
const STALL_GRACE: Duration = Duration::from_secs(2);

/// How long to block on the chunk channel before re-checking the deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One buffer as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioChunk {
    /// Average the channels of every frame.
    pub fn to_mono(&self) -> Vec<f32> {
        downmix(&self.samples, self.channels)
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening or running the microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio device delivered no samples")]
    Stalled,

    #[error("listen window of {0} s is not a usable duration")]
    InvalidWindow(f32),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

// ---------------------------------------------------------------------------
// UtteranceSource
// ---------------------------------------------------------------------------

/// Something that can capture one spoken answer.
pub trait UtteranceSource {
    /// Capture one answer within `window`.  Blocks until an end point.
    fn record_utterance(&mut self, window: &ListenWindow) -> Result<Utterance, CaptureError>;
}

// ---------------------------------------------------------------------------
// Microphone
// ---------------------------------------------------------------------------

/// cpal input device wrapper.
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl Microphone {
    /// Open the default input device, or the device named `name`.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] / [`CaptureError::DeviceNotFound`] when no
    /// matching device exists, [`CaptureError::DefaultConfig`] when the
    /// device cannot report a stream configuration.
    pub fn open(name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match name {
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
            Some(wanted) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(wanted.to_string()))?,
        };

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        log::info!("microphone: {} Hz, {} ch", sample_rate, channels);

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn build_stream(&self, tx: mpsc::Sender<AudioChunk>) -> Result<cpal::Stream, CaptureError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // The receiver is gone once the utterance is complete.
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;
        stream.play()?;
        Ok(stream)
    }
}

/// Wall-clock budget for one capture, including the stall grace period.
fn capture_budget(window: &ListenWindow) -> Result<Duration, CaptureError> {
    let secs = window.max_total_secs();
    Duration::try_from_secs_f32(secs.max(0.0))
        .ok()
        .and_then(|d| d.checked_add(STALL_GRACE))
        .ok_or(CaptureError::InvalidWindow(secs))
}

/// Run the resampler's tail through the detector and take its verdict.
fn finish(
    mut detector: UtteranceDetector,
    resampler: &mut StreamResampler,
) -> Result<Utterance, CaptureError> {
    if let Some(done) = detector.push(&resampler.flush()?) {
        return Ok(done);
    }
    Ok(detector.finish())
}

impl UtteranceSource for Microphone {
    fn record_utterance(&mut self, window: &ListenWindow) -> Result<Utterance, CaptureError> {
        let budget = capture_budget(window)?;
        let mut resampler = StreamResampler::new(self.sample_rate)?;

        let (tx, rx) = mpsc::channel::<AudioChunk>();
        let stream = self.build_stream(tx)?;

        let deadline = Instant::now() + budget;
        let mut detector = UtteranceDetector::new(window);
        let mut received = false;

        let outcome = loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => {
                    received = true;
                    let samples = resampler.push(&chunk.to_mono())?;
                    if let Some(done) = detector.push(&samples) {
                        break done;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    break finish(detector, &mut resampler)?;
                }
            }
            if Instant::now() >= deadline {
                if !received {
                    return Err(CaptureError::Stalled);
                }
                break finish(detector, &mut resampler)?;
            }
        };

        drop(stream);
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
