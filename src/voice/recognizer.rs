//! Microphone-backed speech recognition

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{
    AudioCapture, DetectorState, SAMPLE_RATE, SampleSource, SpeechRecognizer, SpeechToText,
    UtteranceDetector, calculate_energy, samples_to_wav,
};
use crate::Result;
use crate::error::RecognitionFailure;

/// Interval between drains of the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Records one phrase from the microphone and sends it to an STT service
pub struct MicrophoneRecognizer {
    capture: AudioCapture,
    stt: SpeechToText,
    max_listen: Duration,
}

impl MicrophoneRecognizer {
    /// Create a recognizer that gives up listening after `max_listen`
    #[must_use]
    pub const fn new(capture: AudioCapture, stt: SpeechToText, max_listen: Duration) -> Self {
        Self {
            capture,
            stt,
            max_listen,
        }
    }
}

#[async_trait(?Send)]
impl SpeechRecognizer for MicrophoneRecognizer {
    async fn recognize(&mut self) -> Result<String> {
        let speech = record_phrase(&mut self.capture, self.max_listen).await?;

        #[allow(clippy::cast_precision_loss)]
        let seconds = speech.len() as f32 / SAMPLE_RATE as f32;
        tracing::debug!(seconds, "phrase captured");

        let wav = samples_to_wav(&speech, SAMPLE_RATE)?;
        let transcript = self.stt.recognize(&wav).await?;
        tracing::info!(transcript = %transcript, "voice command recognized");
        Ok(transcript)
    }
}

/// What the utterance detector made of one listening window
#[derive(Debug, Clone, Copy)]
pub struct MicReport {
    /// Energy treated as speech after ambient calibration
    pub threshold: f32,
    /// Loudest chunk heard
    pub peak_energy: f32,
    /// Detector state when the window closed
    pub state: DetectorState,
    /// Length of the captured phrase
    pub phrase_secs: f32,
}

/// Listen the way a voice command does and report what was detected
///
/// # Errors
///
/// Returns error if the source cannot be started
pub async fn check_microphone<S: SampleSource>(
    source: &mut S,
    window: Duration,
) -> Result<MicReport> {
    let mut peak_energy = 0.0_f32;
    let detector = run_detector(source, window, |chunk| {
        peak_energy = peak_energy.max(calculate_energy(chunk));
    })
    .await?;

    #[allow(clippy::cast_precision_loss)]
    let phrase_secs = detector.buffer().len() as f32 / SAMPLE_RATE as f32;
    Ok(MicReport {
        threshold: detector.threshold(),
        peak_energy,
        state: detector.state(),
        phrase_secs,
    })
}

/// Stops the source when dropped, including when the listening future is
/// dropped mid-await
struct StopOnDrop<'a, S: SampleSource>(&'a mut S);

impl<S: SampleSource> Drop for StopOnDrop<'_, S> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Record until a phrase ends or the listen window closes
async fn record_phrase<S: SampleSource>(
    source: &mut S,
    max_listen: Duration,
) -> Result<Vec<f32>> {
    let mut detector = run_detector(source, max_listen, |_| {}).await?;

    if !detector.heard_speech() {
        return Err(RecognitionFailure::AudioUnintelligible.into());
    }
    Ok(detector.take_utterance())
}

/// Feed the source into a fresh detector until it completes or `window` ends
async fn run_detector<S: SampleSource>(
    source: &mut S,
    window: Duration,
    mut on_chunk: impl FnMut(&[f32]),
) -> Result<UtteranceDetector> {
    let mut detector = UtteranceDetector::default();
    let started = Instant::now();

    source.start()?;
    let source = StopOnDrop(source);
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let chunk = source.0.take_buffer();
        on_chunk(&chunk);
        if detector.process(&chunk) == DetectorState::Complete {
            break;
        }
        if started.elapsed() >= window {
            tracing::debug!(state = ?detector.state(), "listen window elapsed");
            break;
        }
    }
    drop(source);

    Ok(detector)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;
    use crate::Error;
    use crate::voice::CALIBRATION_SAMPLES;

    /// Source that replays queued chunks, then silence, and records whether
    /// it is running
    struct ScriptedSource {
        chunks: RefCell<VecDeque<Vec<f32>>>,
        running: Cell<bool>,
        starts: Cell<u32>,
    }

    impl ScriptedSource {
        fn new(chunks: impl IntoIterator<Item = Vec<f32>>) -> Self {
            Self {
                chunks: RefCell::new(chunks.into_iter().collect()),
                running: Cell::new(false),
                starts: Cell::new(0),
            }
        }

        fn silent() -> Self {
            Self::new([])
        }
    }

    impl SampleSource for ScriptedSource {
        fn start(&mut self) -> Result<()> {
            self.running.set(true);
            self.starts.set(self.starts.get() + 1);
            Ok(())
        }

        fn stop(&mut self) {
            self.running.set(false);
        }

        fn take_buffer(&self) -> Vec<f32> {
            self.chunks
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| vec![0.0; 1600])
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn tone(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * 440.0 / 16000.0).sin() * 0.5)
            .collect()
    }

    #[tokio::test]
    async fn test_cancelled_listen_stops_source() {
        let mut source = ScriptedSource::silent();

        let listen = record_phrase(&mut source, Duration::from_secs(10));
        let outcome = tokio::time::timeout(Duration::from_millis(250), listen).await;

        assert!(outcome.is_err(), "listening should still be in progress");
        assert_eq!(source.starts.get(), 1);
        assert!(!source.running.get(), "source left running after cancel");
    }

    #[tokio::test]
    async fn test_silent_window_is_unintelligible_and_stops_source() {
        let mut source = ScriptedSource::silent();

        let result = record_phrase(&mut source, Duration::from_millis(500)).await;

        assert!(matches!(
            result,
            Err(Error::Recognition(RecognitionFailure::AudioUnintelligible))
        ));
        assert!(!source.running.get());
    }

    #[tokio::test]
    async fn test_listen_after_cancel_starts_fresh() {
        let mut source = ScriptedSource::silent();

        let first = record_phrase(&mut source, Duration::from_secs(10));
        let _ = tokio::time::timeout(Duration::from_millis(150), first).await;
        let second = record_phrase(&mut source, Duration::from_millis(300)).await;

        assert!(second.is_err());
        assert_eq!(source.starts.get(), 2);
        assert!(!source.running.get());
    }

    #[tokio::test]
    async fn test_check_microphone_reports_phrase() {
        let mut source = ScriptedSource::new([
            vec![0.0; CALIBRATION_SAMPLES],
            tone(8000),
            vec![0.0; 16000],
        ]);

        let report = check_microphone(&mut source, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(report.state, DetectorState::Complete);
        assert!((report.phrase_secs - 1.5).abs() < 0.01);
        assert!(report.peak_energy > report.threshold);
        assert!(!source.running.get());
    }

    #[tokio::test]
    async fn test_check_microphone_reports_silence() {
        let mut source = ScriptedSource::silent();

        let report = check_microphone(&mut source, Duration::from_millis(1500))
            .await
            .unwrap();

        assert_eq!(report.state, DetectorState::Waiting);
        assert!(report.peak_energy < report.threshold);
        assert!(report.phrase_secs.abs() < f32::EPSILON);
    }
}
