//! # speaker-rs
//!
//! Mandarin text-to-speech front-end and synthesis orchestration for VITS
//! style acoustic models.
//!
//! ## Features
//!
//! - **Text normalization**: numerals, jieba segmentation, pinyin, Bopomofo
//!   (zhuyin) rewriting and Latin letter spell-out
//! - **Vocabulary encoding**: symbol table lookup with blank interleaving
//! - **Lazy engine initialization**: at most one engine load, even under
//!   concurrent first calls
//! - **VITS engine**: optional ONNX Runtime backend
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! speaker-rs = { version = "2026.2", features = ["vits"] }
//! ```
//!
//! ```ignore
//! use speaker_rs::{engines::vits::VitsEngine, SayOptions, Speaker, SpeakerOptionsBuilder};
//!
//! let options = SpeakerOptionsBuilder::default()
//!     .model_path("models/speaker/moss.onnx")
//!     .model_config_path("models/speaker/moss.json")
//!     .num_threads(4usize)
//!     .single_speaker(true)
//!     .build()?;
//!
//! let speaker = Speaker::new(options, VitsEngine::new())?;
//! let result = speaker.synthesize("今天是2024年", Default::default())?;
//! result.write_wav(std::path::Path::new("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engines;
pub mod speaker;
pub mod text;
pub mod vocab;

use std::path::Path;
use std::sync::Arc;

pub use config::{ConfigError, ModelConfig};
pub use speaker::{
    real_time_factor, EngineState, SayOptions, SayResult, Speaker, SpeakerError, SpeakerOptions,
    SpeakerOptionsBuilder, SynthesizeOptions,
};
pub use vocab::SymbolTable;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains 16-bit PCM samples plus the timing reported by the engine.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Raw mono PCM samples
    pub samples: Vec<i16>,
    /// Sample rate of the audio (from the model config)
    pub sample_rate: u32,
    /// Inference wall-clock time in milliseconds
    pub infer_duration_ms: u32,
    /// Duration of the produced audio in milliseconds
    pub audio_duration_ms: u32,
    /// `infer / audio`, truncated to three decimals
    pub real_time_factor: f64,
}

impl SynthesisResult {
    /// Write the audio to a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Errors raised by a [`SpeechEngine`] implementation.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[cfg(feature = "vits")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[cfg(feature = "vits")]
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine not initialized. Call initialize() first.")]
    NotInitialized,
    #[error("Audio output failed: {0}")]
    Playback(String),
    #[error("{0}")]
    Backend(String),
}

/// Synthesis parameters handed to the engine on initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    pub sample_rate: u32,
    pub max_wav_value: f32,
    pub length_scale: f32,
    pub noise_scale: f32,
    pub noise_w: f32,
    /// Single-speaker models take no `sid` input.
    pub single_speaker: bool,
    pub num_threads: usize,
    pub audio_device_name: String,
    pub audio_mixer_name: String,
}

/// Timing reported by the engine for one utterance, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineTiming {
    pub infer_duration_ms: u32,
    pub audio_duration_ms: u32,
}

/// Waveform produced by [`SpeechEngine::synthesize`].
#[derive(Debug, Clone, Default)]
pub struct EngineAudio {
    pub samples: Vec<i16>,
    pub timing: EngineTiming,
}

/// Call contract of the native inference and audio-output engine.
///
/// All operations block until complete. Implementations must tolerate
/// concurrent calls once initialized, serializing internally if needed.
pub trait SpeechEngine: Send + Sync {
    /// Load the model and prepare audio output.
    fn initialize(&self, model_path: &Path, params: &EngineParams) -> Result<(), EngineError>;

    /// Synthesize the phoneme ids and play them.
    fn say(
        &self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
        block: bool,
    ) -> Result<EngineTiming, EngineError>;

    /// Synthesize the phoneme ids without playing them.
    fn synthesize(
        &self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
    ) -> Result<EngineAudio, EngineError>;

    /// Set the output volume as a percentage (0-100).
    fn set_volume(&self, percent: u8) -> Result<(), EngineError>;
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Arc<E> {
    fn initialize(&self, model_path: &Path, params: &EngineParams) -> Result<(), EngineError> {
        (**self).initialize(model_path, params)
    }

    fn say(
        &self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
        block: bool,
    ) -> Result<EngineTiming, EngineError> {
        (**self).say(phoneme_ids, speaker_id, speech_rate, block)
    }

    fn synthesize(
        &self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
    ) -> Result<EngineAudio, EngineError> {
        (**self).synthesize(phoneme_ids, speaker_id, speech_rate)
    }

    fn set_volume(&self, percent: u8) -> Result<(), EngineError> {
        (**self).set_volume(percent)
    }
}

