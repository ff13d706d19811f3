//! Interactive first-run setup wizard (`vtodo setup`)

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{
    ApiKeysFileConfig, ConfigFile, StoreFileConfig, TasksFileConfig, VoiceFileConfig,
};
use crate::controller::SelectionKey;
use crate::voice::{SttProvider, TtsProvider};

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Voice To-Do Setup\n");

    // Load existing config if present
    let existing = crate::config::file::load_config_file();
    let config_path = crate::config::file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/voice-todo/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Database location
    let default_db = match &existing.store.path {
        Some(path) => path.clone(),
        None => crate::config::default_data_dir().join("tasks.db"),
    };
    let db_path: String = Input::new()
        .with_prompt("Task database path")
        .default(default_db.display().to_string())
        .interact_text()?;

    // 2. Delete/complete matching
    let match_labels = [
        "task id (only the selected task)",
        "description (every task with that text)",
    ];
    let default_match = match existing.tasks.match_by.unwrap_or_default() {
        SelectionKey::Id => 0,
        SelectionKey::Description => 1,
    };
    let match_idx = Select::new()
        .with_prompt("Delete and complete match tasks by")
        .items(&match_labels)
        .default(default_match)
        .interact()?;
    let match_by = if match_idx == 0 {
        SelectionKey::Id
    } else {
        SelectionKey::Description
    };

    // 3. Voice (optional)
    let mut api_keys = existing.api_keys;
    let enable_voice = Confirm::new()
        .with_prompt("Enable voice (STT/TTS)?")
        .default(existing.voice.enabled.unwrap_or(true))
        .interact()?;

    let voice = if enable_voice {
        let stt_labels = ["OpenAI Whisper", "Deepgram"];
        let stt_idx = Select::new()
            .with_prompt("Speech recognition provider")
            .items(&stt_labels)
            .default(match existing.voice.stt_provider.unwrap_or_default() {
                SttProvider::Whisper => 0,
                SttProvider::Deepgram => 1,
            })
            .interact()?;
        let stt_provider = if stt_idx == 0 {
            SttProvider::Whisper
        } else {
            SttProvider::Deepgram
        };

        let tts_labels = ["OpenAI", "ElevenLabs"];
        let tts_idx = Select::new()
            .with_prompt("Speech output provider")
            .items(&tts_labels)
            .default(match existing.voice.tts_provider.unwrap_or_default() {
                TtsProvider::OpenAI => 0,
                TtsProvider::ElevenLabs => 1,
            })
            .interact()?;
        let tts_provider = if tts_idx == 0 {
            TtsProvider::OpenAI
        } else {
            TtsProvider::ElevenLabs
        };

        if stt_provider == SttProvider::Whisper || tts_provider == TtsProvider::OpenAI {
            api_keys.openai = prompt_key("OpenAI", "OPENAI_API_KEY", api_keys.openai)?;
        }
        if stt_provider == SttProvider::Deepgram {
            api_keys.deepgram = prompt_key("Deepgram", "DEEPGRAM_API_KEY", api_keys.deepgram)?;
        }
        if tts_provider == TtsProvider::ElevenLabs {
            api_keys.elevenlabs =
                prompt_key("ElevenLabs", "ELEVENLABS_API_KEY", api_keys.elevenlabs)?;
        }

        // Keep models that belong to the chosen provider
        let stt_model = existing
            .voice
            .stt_model
            .filter(|_| existing.voice.stt_provider.unwrap_or_default() == stt_provider)
            .unwrap_or_else(|| default_stt_model(stt_provider).to_string());
        let tts_model = existing
            .voice
            .tts_model
            .filter(|_| existing.voice.tts_provider.unwrap_or_default() == tts_provider)
            .unwrap_or_else(|| default_tts_model(tts_provider).to_string());

        let tts_voice: String = Input::new()
            .with_prompt("TTS voice")
            .default(
                existing
                    .voice
                    .tts_voice
                    .unwrap_or_else(|| "alloy".to_string()),
            )
            .interact_text()?;

        VoiceFileConfig {
            enabled: Some(true),
            stt_provider: Some(stt_provider),
            stt_model: Some(stt_model),
            tts_provider: Some(tts_provider),
            tts_model: Some(tts_model),
            tts_voice: Some(tts_voice),
            tts_speed: existing.voice.tts_speed.or(Some(1.0)),
            max_listen_secs: existing.voice.max_listen_secs,
        }
    } else {
        VoiceFileConfig {
            enabled: Some(false),
            ..VoiceFileConfig::default()
        }
    };

    // 4. Build and write config
    let config_file = ConfigFile {
        store: StoreFileConfig {
            path: Some(PathBuf::from(db_path)),
        },
        tasks: TasksFileConfig {
            match_by: Some(match_by),
        },
        voice,
        api_keys,
    };

    write_config(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!("\nSetup complete! Run `vtodo` to open your task list.");

    Ok(())
}

/// Ask for an API key, showing a masked existing one
fn prompt_key(
    name: &str,
    env_hint: &str,
    existing: Option<String>,
) -> anyhow::Result<Option<String>> {
    let prompt = match existing.as_deref().map(mask_key) {
        Some(masked) => format!("{name} API key (current: {masked}, leave blank to keep)"),
        None => format!("{name} API key ({env_hint})"),
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    Ok(if input.trim().is_empty() {
        existing
    } else {
        Some(input.trim().to_string())
    })
}

/// Show the first and last four characters of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

const fn default_stt_model(provider: SttProvider) -> &'static str {
    match provider {
        SttProvider::Whisper => "whisper-1",
        SttProvider::Deepgram => "nova-2",
    }
}

const fn default_tts_model(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::OpenAI => "tts-1",
        TtsProvider::ElevenLabs => "eleven_monolingual_v1",
    }
}

/// Serialize and write the config file
fn write_config(path: &Path, config: &ConfigFile) -> anyhow::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, toml::to_string_pretty(config)?)?;
    tracing::debug!(path = %path.display(), "config file written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-1234567890abcd"), "sk-1...abcd");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_write_config_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ConfigFile {
            tasks: TasksFileConfig {
                match_by: Some(SelectionKey::Description),
            },
            ..ConfigFile::default()
        };

        write_config(&path, &config).unwrap();

        let loaded = crate::config::file::load_config_from(&path);
        assert_eq!(loaded.tasks.match_by, Some(SelectionKey::Description));
    }
}
