//! Speech output

use async_trait::async_trait;

use super::{AudioPlayback, Speaker, TextToSpeech};
use crate::Result;

/// Speaks through a cloud TTS service and the default output device
pub struct CloudSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl CloudSpeaker {
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait(?Send)]
impl Speaker for CloudSpeaker {
    async fn say(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking");
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio).await
    }
}

/// Stand-in used when voice output is disabled; text only goes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

#[async_trait(?Send)]
impl Speaker for LogSpeaker {
    async fn say(&mut self, text: &str) -> Result<()> {
        tracing::info!(text, "speak");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_speaker_always_succeeds() {
        let mut speaker = LogSpeaker;
        assert!(tokio_test::block_on(speaker.say("Task added: buy milk")).is_ok());
    }
}
