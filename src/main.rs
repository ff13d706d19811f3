use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use voice_todo::config::VoiceConfig;
use voice_todo::controller::display;
use voice_todo::db::task::DATE_FORMAT;
use voice_todo::db::{self, NewTask, TaskRepo};
use voice_todo::voice::{
    self, AudioCapture, AudioPlayback, CloudSpeaker, DetectorState, LogSpeaker,
    MicrophoneRecognizer, Speaker, SpeechRecognizer, SpeechToText, TextToSpeech, TtsProvider,
};
use voice_todo::{Config, TaskListController};

/// Voice To-Do - date-organized task list with voice commands
#[derive(Parser)]
#[command(name = "vtodo", version, about)]
struct Cli {
    /// Task database file
    #[arg(long, env = "VTODO_DB")]
    db: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (keyboard only, no audio hardware needed)
    #[arg(long, env = "VTODO_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Interactive task list (default)
    Shell,
    /// Print the tasks filed under a date
    List {
        /// Date as YYYY-MM-DD (default: today)
        #[arg(short, long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Add a task
    Add {
        /// Task description
        description: String,
        /// Date to file the task under (default: today)
        #[arg(short, long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        /// Deadline (default: today)
        #[arg(long, value_parser = parse_date_arg)]
        deadline: Option<NaiveDate>,
    },
    /// Delete a task by id
    Delete {
        id: i64,
    },
    /// Mark a task completed by id
    Complete {
        id: i64,
    },
    /// Find the date in a spoken-style command, e.g. "show tasks for 3rd march"
    ParseDate {
        utterance: String,
    },
    /// Check that a spoken phrase is detected on the microphone
    TestMic {
        /// Listening window in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Interactive first-run setup
    Setup,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voice_todo=info",
        1 => "info,voice_todo=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Command::Shell);

    // Commands that don't touch the task store
    match command {
        Command::Setup => return voice_todo::setup::run_setup(),
        Command::TestMic { duration } => return test_mic(duration).await,
        Command::TestTts { text } => {
            let config = Config::load_with_options(cli.db, false);
            return test_tts(&config.voice, &config.api_keys, &text).await;
        }
        Command::ParseDate { utterance } => return parse_date(&utterance),
        _ => {}
    }

    let config = Config::load_with_options(cli.db, cli.disable_voice);
    tracing::debug!(?config, "loaded configuration");

    let pool = db::init(&config.db_path)
        .with_context(|| format!("opening task database {}", config.db_path.display()))?;
    let repo = TaskRepo::new(pool);
    let today = Local::now().date_naive();

    match command {
        Command::List { date } => list(&repo, date.unwrap_or(today)),
        Command::Add {
            description,
            date,
            deadline,
        } => {
            let task = repo.insert(&NewTask::now(
                description.trim(),
                date.unwrap_or(today),
                deadline.unwrap_or(today),
            ))?;
            println!("Added task {}: {}", task.id, display::render_entry(&task));
            Ok(())
        }
        Command::Delete { id } => {
            if repo.delete(id)? {
                println!("Deleted task {id}");
                Ok(())
            } else {
                anyhow::bail!("no task with id {id}")
            }
        }
        Command::Complete { id } => {
            if repo.mark_completed(id)? {
                println!("Completed task {id}");
                Ok(())
            } else {
                anyhow::bail!("no task with id {id}")
            }
        }
        _ => run_shell(&config, repo, today).await,
    }
}

/// Build the speech collaborators and hand the controller to the shell
#[allow(clippy::future_not_send)]
async fn run_shell(config: &Config, repo: TaskRepo, today: NaiveDate) -> anyhow::Result<()> {
    let (speaker, recognizer) = if config.voice.enabled {
        build_voice(config)
    } else {
        tracing::info!("voice disabled, keyboard only");
        (Box::new(LogSpeaker) as Box<dyn Speaker>, None)
    };

    let mut controller = TaskListController::new(repo, speaker, today)?
        .with_selection_key(config.selection_key);
    if let Some(recognizer) = recognizer {
        controller = controller.with_recognizer(recognizer);
    }

    tracing::info!(
        db = %config.db_path.display(),
        voice = controller.voice_enabled(),
        "task list ready"
    );

    voice_todo::shell::run(&mut controller).await?;
    Ok(())
}

/// Voice collaborators for the configured providers
///
/// Missing keys or audio devices degrade to keyboard input and logged
/// feedback instead of failing startup.
fn build_voice(config: &Config) -> (Box<dyn Speaker>, Option<Box<dyn SpeechRecognizer>>) {
    let voice = &config.voice;

    let recognizer = match config.api_keys.for_stt(voice.stt_provider) {
        Some(key) => match build_recognizer(voice, key) {
            Ok(recognizer) => Some(recognizer),
            Err(e) => {
                tracing::warn!(error = %e, "voice input unavailable");
                None
            }
        },
        None => {
            let provider = voice.stt_provider;
            tracing::warn!(?provider, "no STT API key configured, voice input disabled");
            None
        }
    };

    let speaker: Box<dyn Speaker> = match config.api_keys.for_tts(voice.tts_provider) {
        Some(key) => match build_tts(voice, key).and_then(|tts| {
            let playback = AudioPlayback::new()?;
            Ok(CloudSpeaker::new(tts, playback))
        }) {
            Ok(speaker) => Box::new(speaker),
            Err(e) => {
                tracing::warn!(error = %e, "speech output unavailable, logging instead");
                Box::new(LogSpeaker)
            }
        },
        None => {
            let provider = voice.tts_provider;
            tracing::warn!(?provider, "no TTS API key configured, logging instead");
            Box::new(LogSpeaker)
        }
    };

    (speaker, recognizer)
}

fn build_recognizer(
    voice: &VoiceConfig,
    key: SecretString,
) -> voice_todo::Result<Box<dyn SpeechRecognizer>> {
    let stt = SpeechToText::new(voice.stt_provider, key, voice.stt_model.clone())?;
    let capture = AudioCapture::new()?;
    Ok(Box::new(MicrophoneRecognizer::new(capture, stt, voice.max_listen)))
}

fn build_tts(voice: &VoiceConfig, key: SecretString) -> voice_todo::Result<TextToSpeech> {
    match voice.tts_provider {
        TtsProvider::OpenAI => TextToSpeech::new_openai(
            key,
            voice.tts_voice.clone(),
            voice.tts_speed,
            voice.tts_model.clone(),
        ),
        TtsProvider::ElevenLabs => {
            TextToSpeech::new_elevenlabs(key, voice.tts_voice.clone(), voice.tts_model.clone())
        }
    }
}

/// Print the tasks for a date
fn list(repo: &TaskRepo, date: NaiveDate) -> anyhow::Result<()> {
    let tasks = repo.list_by_date(date)?;
    if tasks.is_empty() {
        println!("No tasks for {}", date.format(DATE_FORMAT));
        return Ok(());
    }

    println!("Tasks for {}:", date.format(DATE_FORMAT));
    for task in &tasks {
        println!("  [{:>3}] {}", task.id, display::render_entry(task));
    }
    Ok(())
}

/// Run the date-search interpreter on typed text
fn parse_date(utterance: &str) -> anyhow::Result<()> {
    let transcript = utterance.trim().to_lowercase();
    match voice::command::parse_date(&transcript) {
        Ok(date) => {
            println!(
                "{} ({})",
                date.format(DATE_FORMAT),
                voice::command::spoken_date(date)
            );
            Ok(())
        }
        Err(failure) => anyhow::bail!("{failure}"),
    }
}

/// Listen for one phrase the way a voice command does and report it
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Listening for up to {duration} seconds.");
    println!("Stay quiet for a second, then say a task such as \"buy milk\".\n");

    let mut capture = AudioCapture::new()?;
    let window = Duration::from_secs(duration);
    let report = voice::check_microphone(&mut capture, window).await?;

    println!("Speech threshold: {:.4}", report.threshold);
    println!("Loudest chunk:    {:.4}", report.peak_energy);
    match report.state {
        DetectorState::Complete => {
            let secs = report.phrase_secs;
            println!("Phrase detected: {secs:.1}s, ready for speech recognition");
        }
        DetectorState::Speaking => {
            println!("Speech started but no pause was heard before the window closed");
        }
        DetectorState::Waiting => println!("Nothing rose above the speech threshold"),
        DetectorState::Calibrating => {
            println!("The window closed while measuring background noise");
        }
    }

    Ok(())
}

/// Test TTS output with the configured provider
async fn test_tts(
    voice: &VoiceConfig,
    api_keys: &voice_todo::config::ApiKeys,
    text: &str,
) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let key = api_keys.for_tts(voice.tts_provider).with_context(|| {
        format!(
            "no API key configured for {:?} TTS (run `vtodo setup`)",
            voice.tts_provider
        )
    })?;
    let tts = build_tts(voice, key)?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    // Check MP3 header
    if mp3_data.len() > 3 {
        println!(
            "First 4 bytes: {:02x} {:02x} {:02x} {:02x}",
            mp3_data[0], mp3_data[1], mp3_data[2], mp3_data[3]
        );
    }

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
