//! TOML configuration file loading
//!
//! Supports `~/.config/voice-todo/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controller::SelectionKey;
use crate::voice::{SttProvider, TtsProvider};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Task database location
    #[serde(default)]
    pub store: StoreFileConfig,

    /// Task list behavior
    #[serde(default)]
    pub tasks: TasksFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for speech services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Task database configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StoreFileConfig {
    /// Path to the `SQLite` file
    pub path: Option<PathBuf>,
}

/// Task list configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TasksFileConfig {
    /// How delete/complete identify tasks ("id" or "description")
    pub match_by: Option<SelectionKey>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// STT backend ("whisper" or "deepgram")
    pub stt_provider: Option<SttProvider>,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: Option<String>,

    /// TTS backend ("openai" or "elevenlabs")
    pub tts_provider: Option<TtsProvider>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy", or an ElevenLabs voice id)
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,

    /// Longest time to wait for one spoken command, in seconds
    pub max_listen_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    config_file_path().map_or_else(ConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file, falling back to defaults
pub fn load_config_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-todo/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-todo").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml"));
        assert!(config.voice.enabled.is_none());
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [tasks]
            match_by = "description"

            [voice]
            stt_provider = "deepgram"
            tts_speed = 1.25
            "#,
        )
        .unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.tasks.match_by, Some(SelectionKey::Description));
        assert_eq!(config.voice.stt_provider, Some(SttProvider::Deepgram));
        assert_eq!(config.voice.tts_speed, Some(1.25));
        assert!(config.voice.tts_provider.is_none());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[voice\nenabled = maybe").unwrap();

        let config = load_config_from(&path);
        assert!(config.voice.enabled.is_none());
    }

    #[test]
    fn test_serialized_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = ConfigFile {
            voice: VoiceFileConfig {
                enabled: Some(true),
                tts_provider: Some(TtsProvider::ElevenLabs),
                ..VoiceFileConfig::default()
            },
            ..ConfigFile::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&original).unwrap()).unwrap();

        let loaded = load_config_from(&path);
        assert_eq!(loaded.voice.enabled, Some(true));
        assert_eq!(loaded.voice.tts_provider, Some(TtsProvider::ElevenLabs));
    }
}
