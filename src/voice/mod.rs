//! Voice input and output
//!
//! Microphone capture, end-of-utterance detection, cloud STT/TTS, and the
//! interpreter that turns transcripts into task text or calendar dates.
//! The controller only sees the [`SpeechRecognizer`] and [`Speaker`] traits.

mod capture;
pub mod command;
mod playback;
mod recognizer;
mod speaker;
pub mod stt;
pub mod tts;
mod utterance;

use async_trait::async_trait;

pub use capture::{AudioCapture, SAMPLE_RATE, SampleSource, samples_to_wav};
pub use playback::AudioPlayback;
pub use recognizer::{MicReport, MicrophoneRecognizer, check_microphone};
pub use speaker::{CloudSpeaker, LogSpeaker};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};
pub use utterance::{CALIBRATION_SAMPLES, DetectorState, UtteranceDetector, calculate_energy};

use crate::Result;

/// Captures one spoken utterance and transcribes it
///
/// Futures are not `Send`: audio streams are tied to the thread that opened
/// them. Dropping the future cancels the capture.
#[async_trait(?Send)]
pub trait SpeechRecognizer {
    /// Listen for one utterance and return its lowercase transcript
    ///
    /// # Errors
    ///
    /// Returns `RecognitionFailure::AudioUnintelligible` or
    /// `RecognitionFailure::ServiceUnavailable` when no transcript is
    /// available, or an audio error when the microphone fails
    async fn recognize(&mut self) -> Result<String>;
}

/// Vocalizes text, returning once it has been spoken
#[async_trait(?Send)]
pub trait Speaker {
    /// Speak `text`
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn say(&mut self, text: &str) -> Result<()>;
}
