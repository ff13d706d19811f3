//! Speech-to-text (STT) processing

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::RecognitionFailure;
use crate::{Error, Result};

/// Response from OpenAI Whisper transcription API
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    #[default]
    Whisper,
    Deepgram,
}

impl std::str::FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create a new STT instance for a provider
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(provider: SttProvider, api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            let name = match provider {
                SttProvider::Whisper => "OpenAI API key required for Whisper",
                SttProvider::Deepgram => "Deepgram API key required",
            };
            return Err(Error::Config(name.to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` when the service cannot be reached,
    /// `RecognitionFailure::AudioUnintelligible` when it rejects the audio,
    /// and `Error::Stt` for any other error status
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await,
        }
    }

    /// Transcribe one utterance into a lowercase command transcript
    ///
    /// # Errors
    ///
    /// Returns `RecognitionFailure::ServiceUnavailable` when the service cannot
    /// be used and `RecognitionFailure::AudioUnintelligible` when it returns
    /// nothing usable
    pub async fn recognize(&self, audio: &[u8]) -> Result<String> {
        let text = self.transcribe(audio).await.map_err(|e| {
            tracing::warn!(error = %e, "transcription failed");
            classify_failure(e)
        })?;

        normalize_transcript(&text).ok_or_else(|| RecognitionFailure::AudioUnintelligible.into())
    }

    /// Transcribe using OpenAI Whisper
    async fn transcribe_whisper(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            if rejected_audio(status) {
                return Err(RecognitionFailure::AudioUnintelligible.into());
            }
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }

    /// Transcribe using Deepgram
    async fn transcribe_deepgram(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Token {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            if rejected_audio(status) {
                return Err(RecognitionFailure::AudioUnintelligible.into());
            }
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let transcript = deepgram_transcript(&response.text().await?)?;
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

/// Pull the first alternative's transcript out of a Deepgram response body
fn deepgram_transcript(body: &str) -> Result<String> {
    let result: DeepgramResponse = serde_json::from_str(body)?;
    Ok(result
        .results
        .channels
        .into_iter()
        .next()
        .and_then(|c| c.alternatives.into_iter().next())
        .map(|a| a.transcript)
        .unwrap_or_default())
}

/// Lowercase a transcript and drop the trailing punctuation STT services add
///
/// Returns `None` when nothing but punctuation or whitespace remains.
#[must_use]
pub fn normalize_transcript(text: &str) -> Option<String> {
    let trimmed = text
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim_end();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Whether the service refused the upload as undecodable speech
fn rejected_audio(status: reqwest::StatusCode) -> bool {
    matches!(
        status,
        reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY
    )
}

/// Map a transport or service error onto the recognition taxonomy
fn classify_failure(err: Error) -> Error {
    match err {
        Error::Recognition(_) => err,
        _ => RecognitionFailure::ServiceUnavailable.into(),
    }
}
