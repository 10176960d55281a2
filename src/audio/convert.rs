//! Sample-format conversion for the STT engine.
//!
//! Whisper wants **16 kHz mono `f32`**; devices usually deliver 44.1 or
//! 48 kHz interleaved stereo.  [`downmix`] averages the channels of each
//! frame.  [`StreamResampler`] converts the mono stream to [`TARGET_RATE`]
//! with `rubato`, keeping its filter state and any partial block between
//! device buffers so buffer boundaries leave no seams.

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

/// Sample rate expected by the STT engine and the endpoint detector.
pub const TARGET_RATE: u32 = 16_000;

/// Input frames handed to the FFT resampler per block.
const BLOCK_FRAMES: usize = 1024;

/// FFT sub-chunks per block.
const SUB_CHUNKS: usize = 2;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("device reported a sample rate of 0 Hz")]
    ZeroRate,

    #[error("failed to build resampler: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),
}

/// Average interleaved channels into one.
///
/// ```rust
/// use truck_inspect::audio::downmix;
///
/// let stereo = [0.4_f32, 0.0, -0.2, -0.2];
/// assert_eq!(downmix(&stereo, 2), vec![0.2, -0.2]);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = usize::from(n);
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// StreamResampler
// ---------------------------------------------------------------------------

/// Mono resampler from the device rate to [`TARGET_RATE`], fed one device
/// buffer at a time.
///
/// Input is queued until a full block is available, so the output depends
/// only on the concatenated input and not on how it was split.
///
/// ```rust
/// use truck_inspect::audio::StreamResampler;
///
/// let mut passthrough = StreamResampler::new(16_000).unwrap();
/// assert_eq!(passthrough.push(&[0.5_f32; 160]).unwrap().len(), 160);
/// ```
pub struct StreamResampler {
    /// `None` when the device already runs at [`TARGET_RATE`].
    fft: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
}

impl StreamResampler {
    pub fn new(source_rate: u32) -> Result<Self, ConvertError> {
        if source_rate == 0 {
            return Err(ConvertError::ZeroRate);
        }
        let fft = if source_rate == TARGET_RATE {
            None
        } else {
            Some(FftFixedIn::<f32>::new(
                source_rate as usize,
                TARGET_RATE as usize,
                BLOCK_FRAMES,
                SUB_CHUNKS,
                1,
            )?)
        };
        Ok(Self {
            fft,
            pending: Vec::new(),
        })
    }

    /// Queue `mono` and return every 16 kHz sample that is now complete.
    pub fn push(&mut self, mono: &[f32]) -> Result<Vec<f32>, ConvertError> {
        let Some(fft) = self.fft.as_mut() else {
            return Ok(mono.to_vec());
        };
        self.pending.extend_from_slice(mono);

        let mut out = Vec::new();
        loop {
            let needed = fft.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let block = {
                let input = [&self.pending[..needed]];
                fft.process(&input[..], None)?
            };
            if let Some(channel) = block.first() {
                out.extend_from_slice(channel);
            }
            self.pending.drain(..needed);
        }
        Ok(out)
    }

    /// Resample whatever is still queued, zero-padding the last block.
    pub fn flush(&mut self) -> Result<Vec<f32>, ConvertError> {
        let Some(fft) = self.fft.as_mut() else {
            return Ok(Vec::new());
        };
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let block = {
            let input = [&self.pending[..]];
            fft.process_partial(Some(&input[..]), None)?
        };
        self.pending.clear();
        Ok(block.into_iter().next().unwrap_or_default())
    }

    /// Frames waiting for a full block.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
