//! Application settings structs, defaults and TOML persistence.
//!
//! Every struct is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides the keys it names.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::inspection::QuestionSchedule;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ListenConfig
// ---------------------------------------------------------------------------

/// Bounds for capturing one spoken answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Ambient-noise calibration before each answer.
    pub calibration_secs: f32,
    /// Maximum wait for the operator to start speaking.
    pub timeout_secs: f32,
    /// Maximum length of one answer.
    pub phrase_limit_secs: f32,
    /// Quiet time that ends an answer.
    pub trailing_silence_secs: f32,
    /// Speech threshold as a multiple of the calibrated ambient level.
    pub energy_ratio: f32,
    /// Floor for the speech threshold (RMS, 0.0 – 1.0).
    pub min_energy: f32,
    /// Input device name: `None` means the system default.
    pub device: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            calibration_secs: 1.0,
            timeout_secs: 20.0,
            phrase_limit_secs: 20.0,
            trailing_silence_secs: 0.8,
            energy_ratio: 1.5,
            min_energy: 0.01,
            device: None,
        }
    }
}

impl ListenConfig {
    /// Durations must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("calibration_secs", self.calibration_secs),
            ("timeout_secs", self.timeout_secs),
            ("phrase_limit_secs", self.phrase_limit_secs),
            ("trailing_silence_secs", self.trailing_silence_secs),
        ] {
            ensure!(
                secs.is_finite() && secs >= 0.0,
                "listen.{name} must be a finite, non-negative number of seconds (got {secs})"
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper STT engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// GGML model file.  Relative paths resolve against the data directory.
    pub model_path: PathBuf,
    /// ISO-639-1 code, or `"auto"`.
    pub language: String,
    pub use_gpu: bool,
    /// Beam width for beam-search decoding; `0` decodes greedily.
    pub beam_size: u32,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: "en".into(),
            use_gpu: false,
            beam_size: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Text-to-speech output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// TTS program; the text is passed as the last argument.
    pub command: String,
    /// Extra arguments placed before the text.
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let command = if cfg!(target_os = "macos") { "say" } else { "espeak" };
        Self {
            enabled: true,
            command: command.into(),
            args: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Retry behaviour of the question loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Attempts per question before the session gives up; `0` = unbounded.
    pub max_attempts: u32,
    /// Spoken after a failed attempt; `{field}` is replaced by the
    /// lower-cased field name.
    pub apology: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            apology: "Sorry, I couldn't get you. Can you please repeat the {field}?".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Document store location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sled database directory: `None` uses [`AppPaths::database_dir`].
    pub database_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// Page geometry and typography of the PDF report (PDF points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub file_name: String,
    pub page_width: i64,
    pub page_height: i64,
    pub margin_left: i64,
    pub margin_top: i64,
    pub margin_bottom: i64,
    pub title_size: i64,
    pub body_size: i64,
    /// Vertical advance after the title.
    pub title_step: i64,
    /// Vertical advance after every other line.
    pub line_step: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        // US Letter
        Self {
            title: "Truck Inspection Report".into(),
            file_name: "truck_inspection_report.pdf".into(),
            page_width: 612,
            page_height: 792,
            margin_left: 50,
            margin_top: 50,
            margin_bottom: 50,
            title_size: 16,
            body_size: 12,
            title_step: 30,
            line_step: 20,
        }
    }
}

impl ReportConfig {
    /// Sizes and steps must be positive and the margins must leave room for
    /// at least one line.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("title_size", self.title_size),
            ("body_size", self.body_size),
            ("title_step", self.title_step),
            ("line_step", self.line_step),
        ] {
            ensure!(value > 0, "report.{name} must be positive (got {value})");
        }
        for (name, value) in [
            ("margin_left", self.margin_left),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
        ] {
            ensure!(value >= 0, "report.{name} must not be negative (got {value})");
        }
        ensure!(
            self.page_height - self.margin_top >= self.margin_bottom,
            "report margins leave no room on a {}pt page",
            self.page_height
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ImagesConfig
// ---------------------------------------------------------------------------

/// Image lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub bind: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use truck_inspect::config::AppConfig;
///
/// // Returns defaults when the file does not exist yet.
/// let config = AppConfig::load().unwrap();
/// assert!(config.schedule().validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen: ListenConfig,
    pub stt: SttConfig,
    pub speech: SpeechConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub images: ImagesConfig,
    /// Custom questionnaire; `None` uses the truck inspection schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<QuestionSchedule>,
}

impl AppConfig {
    /// Load from the platform `settings.toml` (defaults when missing).
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    ///
    /// A file that exists but does not parse, or whose listen or report
    /// values are out of range, is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(config)
    }

    /// Load the settings the CLI asked for.
    ///
    /// A file named explicitly (`explicit == true`) must load; the implicit
    /// platform file falls back to defaults with a warning.
    pub fn load_for_cli(path: &Path, explicit: bool) -> Result<Self> {
        match Self::load_from(path) {
            Ok(config) => Ok(config),
            Err(e) if explicit => Err(e),
            Err(e) => {
                log::warn!("Failed to load config ({e:#}); using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.listen.validate()?;
        self.report.validate()?;
        Ok(())
    }

    /// Save to the platform `settings.toml`, creating directories.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// The questionnaire to run.
    pub fn schedule(&self) -> QuestionSchedule {
        self.schedule.clone().unwrap_or_default()
    }

    /// sled database directory.
    pub fn database_dir(&self, paths: &AppPaths) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| paths.database_dir.clone())
    }

    /// Whisper model file; relative paths resolve against the data directory.
    pub fn model_path(&self, paths: &AppPaths) -> PathBuf {
        if self.stt.model_path.is_absolute() {
            self.stt.model_path.clone()
        } else {
            paths.data_dir.join(&self.stt.model_path)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
