//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\speech-practice\
//!   macOS:   ~/Library/Application Support/speech-practice/
//!   Linux:   ~/.config/speech-practice/
//!
//! Data dir (session history, synthesized audio):
//!   Windows: %LOCALAPPDATA%\speech-practice\
//!   macOS:   ~/Library/Application Support/speech-practice/
//!   Linux:   ~/.local/share/speech-practice/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to the key-value store holding session history.
    pub history_file: PathBuf,
    /// Directory where synthesized utterances are written.
    pub audio_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speech-practice";

    /// Resolves all paths, falling back to the current directory when the
    /// platform cannot provide a standard one.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            history_file: data_dir.join("history.json"),
            audio_dir: data_dir.join("audio"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
