//! Configuration management for the voice todo list

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::controller::SelectionKey;
use crate::voice::{SttProvider, TtsProvider};

use self::file::ConfigFile;

/// Default time to wait for one spoken command
pub const DEFAULT_MAX_LISTEN_SECS: u64 = 10;

/// Voice todo configuration
#[derive(Debug)]
pub struct Config {
    /// Task database file
    pub db_path: PathBuf,

    /// How delete/complete identify the selected task
    pub selection_key: SelectionKey,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input and spoken feedback
    pub enabled: bool,

    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Longest time to wait for one spoken command
    pub max_listen: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: SttProvider::default(),
            stt_model: "whisper-1".to_string(),
            tts_provider: TtsProvider::default(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            max_listen: Duration::from_secs(DEFAULT_MAX_LISTEN_SECS),
        }
    }
}

/// API keys for speech services
#[derive(Debug, Default)]
pub struct ApiKeys {
    pub openai: Option<SecretString>,
    pub deepgram: Option<SecretString>,
    pub elevenlabs: Option<SecretString>,
}

impl ApiKeys {
    /// Key for the configured STT backend
    #[must_use]
    pub fn for_stt(&self, provider: SttProvider) -> Option<SecretString> {
        let key = match provider {
            SttProvider::Whisper => self.openai.as_ref(),
            SttProvider::Deepgram => self.deepgram.as_ref(),
        };
        key.map(|k| SecretString::from(k.expose_secret()))
    }

    /// Key for the configured TTS backend
    #[must_use]
    pub fn for_tts(&self, provider: TtsProvider) -> Option<SecretString> {
        let key = match provider {
            TtsProvider::OpenAI => self.openai.as_ref(),
            TtsProvider::ElevenLabs => self.elevenlabs.as_ref(),
        };
        key.map(|k| SecretString::from(k.expose_secret()))
    }
}

/// Return the data directory, `~/.local/share/voice-todo` on Linux
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("voice-todo"))
}

impl Config {
    /// Load configuration with command line overrides
    ///
    /// Precedence is flag > env > toml > default.
    #[must_use]
    pub fn load_with_options(db_override: Option<PathBuf>, disable_voice: bool) -> Self {
        let fc = file::load_config_file();
        let env = |key: &str| std::env::var(key).ok();
        let config = Self::resolve(fc, env, db_override, disable_voice);

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }
        tracing::debug!(
            db = %config.db_path.display(),
            voice = config.voice.enabled,
            match_by = ?config.selection_key,
            "configuration loaded"
        );
        config
    }

    /// Merge flags, environment lookups and file values
    #[must_use]
    pub fn resolve(
        fc: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        db_override: Option<PathBuf>,
        disable_voice: bool,
    ) -> Self {
        let secret = |var: &str, file_value: Option<String>| {
            env(var)
                .or(file_value)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from)
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            openai: secret("OPENAI_API_KEY", fc.api_keys.openai),
            deepgram: secret("DEEPGRAM_API_KEY", fc.api_keys.deepgram),
            elevenlabs: secret("ELEVENLABS_API_KEY", fc.api_keys.elevenlabs),
        };

        let defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: !disable_voice
                && env("VTODO_DISABLE_VOICE").is_none_or(|v| !is_truthy(&v))
                && fc.voice.enabled.unwrap_or(defaults.enabled),
            stt_provider: parsed(&env, "VTODO_STT_PROVIDER")
                .or(fc.voice.stt_provider)
                .unwrap_or(defaults.stt_provider),
            stt_model: env("VTODO_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.stt_model),
            tts_provider: parsed(&env, "VTODO_TTS_PROVIDER")
                .or(fc.voice.tts_provider)
                .unwrap_or(defaults.tts_provider),
            tts_model: env("VTODO_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: env("VTODO_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(defaults.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(defaults.tts_speed),
            max_listen: fc
                .voice
                .max_listen_secs
                .filter(|&secs| secs > 0)
                .map_or(defaults.max_listen, Duration::from_secs),
        };

        let selection_key = parsed(&env, "VTODO_MATCH_BY")
            .or(fc.tasks.match_by)
            .unwrap_or_default();

        let db_path = db_override
            .or_else(|| env("VTODO_DB").map(PathBuf::from))
            .or(fc.store.path)
            .unwrap_or_else(|| default_data_dir().join("tasks.db"));

        Self {
            db_path,
            selection_key,
            voice,
            api_keys,
        }
    }
}

/// Parse an env value, warning and ignoring it when malformed
fn parsed<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr<Err = crate::Error>,
{
    let raw = env(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(var = key, error = %e, "ignoring invalid environment value");
            None
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
