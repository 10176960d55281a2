//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\truck-inspect\
//!   macOS:   ~/Library/Application Support/truck-inspect/
//!   Linux:   ~/.config/truck-inspect/
//!
//! Data dir (database, models, reports):
//!   Windows: %LOCALAPPDATA%\truck-inspect\
//!   macOS:   ~/Library/Application Support/truck-inspect/
//!   Linux:   ~/.local/share/truck-inspect/

use std::path::PathBuf;

/// Resolved application directories and files.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    /// `settings.toml`
    pub settings_file: PathBuf,
    pub data_dir: PathBuf,
    /// sled database directory.
    pub database_dir: PathBuf,
    /// Default output directory for PDF reports.
    pub reports_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "truck-inspect";

    /// Falls back to the current directory when the platform has no
    /// standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            database_dir: data_dir.join("inspections.db"),
            reports_dir: data_dir.join("reports"),
            config_dir,
            data_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
