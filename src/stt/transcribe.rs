//! Whisper inference parameters.

use crate::config::SttConfig;

/// Owned mirror of `whisper_rs::SamplingStrategy`.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    Greedy { best_of: i32 },
    BeamSearch { beam_size: i32, patience: f32 },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

impl SamplingStrategy {
    /// Greedy for `0`, otherwise beam search with Whisper's default patience.
    pub fn from_beam_size(beam_size: u32) -> Self {
        match beam_size {
            0 => Self::default(),
            n => Self::BeamSearch {
                beam_size: i32::try_from(n).unwrap_or(i32::MAX),
                patience: -1.0,
            },
        }
    }
}

/// Parameters for one transcription run.
///
/// ```
/// use truck_inspect::stt::TranscribeParams;
///
/// let params = TranscribeParams::default();
/// assert_eq!(params.language, "en");
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 code, or `"auto"` for Whisper's language detection.
    pub language: String,
    pub strategy: SamplingStrategy,
    /// CPU threads for inference, at most 8.
    pub n_threads: i32,
    /// Keep Whisper quiet on stderr.
    pub suppress_progress: bool,
    pub use_gpu: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
            use_gpu: false,
        }
    }
}

impl From<&SttConfig> for TranscribeParams {
    fn from(config: &SttConfig) -> Self {
        Self {
            language: config.language.clone(),
            use_gpu: config.use_gpu,
            strategy: SamplingStrategy::from_beam_size(config.beam_size),
            ..Self::default()
        }
    }
}

/// Available parallelism, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_threads_is_positive_and_at_most_8() {
        let t = optimal_threads();
        assert!((1..=8).contains(&t));
    }

    #[test]
    fn params_follow_config_language() {
        let config = SttConfig {
            language: "auto".into(),
            ..SttConfig::default()
        };
        let params = TranscribeParams::from(&config);
        assert_eq!(params.language, "auto");
        assert_eq!(params.strategy, SamplingStrategy::Greedy { best_of: 1 });
    }

    #[test]
    fn beam_size_selects_beam_search() {
        let config = SttConfig {
            beam_size: 5,
            ..SttConfig::default()
        };
        assert_eq!(
            TranscribeParams::from(&config).strategy,
            SamplingStrategy::BeamSearch {
                beam_size: 5,
                patience: -1.0
            }
        );
    }
}
