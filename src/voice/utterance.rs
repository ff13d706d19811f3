//! End-of-utterance detection
//!
//! Listens for a single spoken phrase: measures the ambient noise floor,
//! waits for speech above it, and completes after a trailing pause.

/// Lowest energy threshold accepted as speech, whatever the ambient level
const MIN_ENERGY_THRESHOLD: f32 = 0.03;

/// Speech must be this much louder than the measured ambient level
const AMBIENT_MULTIPLIER: f32 = 1.5;

/// Ambient noise measurement window (in samples at 16kHz)
pub const CALIBRATION_SAMPLES: usize = 16000; // 1 second

/// Minimum duration of speech for a phrase (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Pause that ends a phrase (in samples at 16kHz)
const PAUSE_SAMPLES: usize = 12800; // 0.8 seconds

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Measuring ambient noise
    Calibrating,
    /// Waiting for speech to start
    Waiting,
    /// Speech in progress, accumulating
    Speaking,
    /// A phrase followed by a pause was captured
    Complete,
}

/// Detects one spoken phrase in an audio stream
pub struct UtteranceDetector {
    state: DetectorState,
    calibration_samples: usize,
    ambient_sum_squares: f32,
    ambient_count: usize,
    threshold: f32,
    buffer: Vec<f32>,
    speech_count: usize,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new(CALIBRATION_SAMPLES)
    }
}

impl UtteranceDetector {
    /// Create a detector that measures ambient noise over `calibration_samples`
    ///
    /// Zero skips calibration and uses the minimum threshold.
    #[must_use]
    pub const fn new(calibration_samples: usize) -> Self {
        Self {
            state: if calibration_samples == 0 {
                DetectorState::Waiting
            } else {
                DetectorState::Calibrating
            },
            calibration_samples,
            ambient_sum_squares: 0.0,
            ambient_count: 0,
            threshold: MIN_ENERGY_THRESHOLD,
            buffer: Vec::new(),
            speech_count: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples and return the resulting state
    pub fn process(&mut self, samples: &[f32]) -> DetectorState {
        if samples.is_empty() {
            return self.state;
        }

        match self.state {
            DetectorState::Calibrating => self.calibrate(samples),
            DetectorState::Waiting => {
                if calculate_energy(samples) > self.threshold {
                    self.state = DetectorState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_count = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(threshold = self.threshold, "speech started");
                }
            }
            DetectorState::Speaking => self.accumulate(samples),
            DetectorState::Complete => {}
        }

        self.state
    }

    fn calibrate(&mut self, samples: &[f32]) {
        self.ambient_sum_squares += samples.iter().map(|s| s * s).sum::<f32>();
        self.ambient_count += samples.len();

        if self.ambient_count >= self.calibration_samples {
            #[allow(clippy::cast_precision_loss)]
            let ambient = (self.ambient_sum_squares / self.ambient_count as f32).sqrt();
            self.threshold = (ambient * AMBIENT_MULTIPLIER).max(MIN_ENERGY_THRESHOLD);
            self.state = DetectorState::Waiting;
            tracing::debug!(ambient, threshold = self.threshold, "ambient noise calibrated");
        }
    }

    fn accumulate(&mut self, samples: &[f32]) {
        self.buffer.extend_from_slice(samples);

        if calculate_energy(samples) > self.threshold {
            self.speech_count += samples.len();
            self.silence_counter = 0;
        } else {
            self.silence_counter += samples.len();
        }

        if self.silence_counter > PAUSE_SAMPLES {
            if self.speech_count > MIN_SPEECH_SAMPLES {
                tracing::debug!(samples = self.buffer.len(), "utterance complete");
                self.state = DetectorState::Complete;
            } else {
                // Too short to be a phrase
                tracing::trace!(speech = self.speech_count, "discarding noise burst");
                self.state = DetectorState::Waiting;
                self.buffer.clear();
                self.speech_count = 0;
                self.silence_counter = 0;
            }
        }
    }

    /// Take the captured phrase, leaving the buffer empty
    ///
    /// Also returns a phrase still in progress, so a listen timeout can hand
    /// partial speech to the recognizer.
    pub fn take_utterance(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.buffer)
    }

    /// Samples captured so far
    #[must_use]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Whether any speech above the threshold has been heard
    #[must_use]
    pub const fn heard_speech(&self) -> bool {
        self.speech_count > 0
    }

    /// Energy level treated as speech
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
