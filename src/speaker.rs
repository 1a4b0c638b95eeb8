//! Synthesis orchestrator.
//!
//! [`Speaker`] owns the parsed model config, the symbol table, the text
//! normalizer and one speech engine. The engine is initialized lazily by
//! the first call to [`Speaker::say`], [`Speaker::synthesize`] or
//! [`Speaker::set_volume`]; concurrent first callers wait on a single gate
//! and the engine is loaded at most once.
//!
//! One `Speaker` is meant to be created at the application's composition
//! root and shared by reference (or `Arc`) with every consumer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use derive_builder::Builder;
use parking_lot::Mutex;

use crate::config::{ConfigError, ModelConfig};
use crate::text::{Romanizer, TextNormalizer};
use crate::vocab::SymbolTable;
use crate::{EngineError, EngineParams, SpeechEngine, SynthesisResult};

/// Speaker index used when a request names no speaker.
pub const DEFAULT_SPEAKER_ID: i64 = 0;

/// Highest accepted volume percentage.
pub const MAX_VOLUME: u8 = 100;

#[derive(thiserror::Error, Debug)]
pub enum SpeakerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Speech engine initialization failed: {0}")]
    Initialization(#[source] EngineError),
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[source] EngineError),
    #[error("Speaker '{0}' not found in model config")]
    UnknownSpeaker(String),
}

/// Construction options for a [`Speaker`].
#[derive(Debug, Clone, Builder)]
pub struct SpeakerOptions {
    /// ONNX model file
    #[builder(setter(into))]
    pub model_path: PathBuf,
    /// Model config JSON next to the checkpoint
    #[builder(setter(into))]
    pub model_config_path: PathBuf,
    /// Inference threads, must be positive
    pub num_threads: usize,
    /// Overrides `data.length_scale` from the model config
    #[builder(default, setter(strip_option))]
    pub length_scale: Option<f32>,
    #[builder(default, setter(strip_option))]
    pub noise_scale: Option<f32>,
    #[builder(default, setter(strip_option))]
    pub noise_w: Option<f32>,
    #[builder(default)]
    pub single_speaker: bool,
    #[builder(default = "\"default\".to_string()", setter(into))]
    pub audio_device_name: String,
    #[builder(default = "\"PCM\".to_string()", setter(into))]
    pub audio_mixer_name: String,
}

/// Options for [`Speaker::say`].
#[derive(Debug, Clone)]
pub struct SayOptions {
    /// Speech rate multiplier, nominally 0.1-2.0. Passed to the engine as is.
    pub speech_rate: f32,
    /// Block until playback finishes.
    pub block: bool,
    /// Named speaker from the model config. `None` uses speaker 0.
    pub speaker: Option<String>,
}

impl Default for SayOptions {
    fn default() -> Self {
        Self {
            speech_rate: 1.0,
            block: false,
            speaker: None,
        }
    }
}

/// Options for [`Speaker::synthesize`].
#[derive(Debug, Clone)]
pub struct SynthesizeOptions {
    pub speech_rate: f32,
    pub speaker: Option<String>,
}

impl Default for SynthesizeOptions {
    fn default() -> Self {
        Self {
            speech_rate: 1.0,
            speaker: None,
        }
    }
}

/// Timing of a played utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SayResult {
    pub infer_duration_ms: u32,
    pub audio_duration_ms: u32,
    pub real_time_factor: f64,
}

/// Engine lifecycle. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Ready,
            1 => Self::Initializing,
            _ => Self::Uninitialized,
        }
    }
}

/// `infer / audio`, truncated (not rounded) to three decimals.
///
/// Returns 0.0 when no audio was produced.
pub fn real_time_factor(infer_duration_ms: u32, audio_duration_ms: u32) -> f64 {
    if audio_duration_ms == 0 {
        return 0.0;
    }
    (f64::from(infer_duration_ms) / f64::from(audio_duration_ms) * 1000.0).floor() / 1000.0
}

/// Text-to-speech front-end bound to one lazily initialized engine.
pub struct Speaker<E: SpeechEngine> {
    options: SpeakerOptions,
    model_config: ModelConfig,
    symbols: SymbolTable,
    normalizer: TextNormalizer,
    engine: E,
    init_gate: Mutex<()>,
    state: AtomicU8,
    volume: Mutex<Option<u8>>,
}

impl<E: SpeechEngine> Speaker<E> {
    /// Validate `options`, load the model config and use jieba + pinyin for
    /// Mandarin text.
    ///
    /// No engine call is made here.
    #[cfg(feature = "mandarin")]
    pub fn new(options: SpeakerOptions, engine: E) -> Result<Self, SpeakerError> {
        Self::build(options, engine, || {
            Box::new(crate::text::JiebaPinyin::new()) as Box<dyn Romanizer>
        })
    }

    /// Like [`Speaker::new`] with a custom segmentation/romanization backend.
    pub fn with_romanizer(
        options: SpeakerOptions,
        engine: E,
        romanizer: Box<dyn Romanizer>,
    ) -> Result<Self, SpeakerError> {
        Self::build(options, engine, || romanizer)
    }

    fn build(
        options: SpeakerOptions,
        engine: E,
        romanizer: impl FnOnce() -> Box<dyn Romanizer>,
    ) -> Result<Self, SpeakerError> {
        validate_options(&options)?;
        let model_config = ModelConfig::load(&options.model_config_path)?;
        let symbols = SymbolTable::from_config(&model_config);
        let normalizer = TextNormalizer::new(model_config.text_cleaner_names(), romanizer());

        log::info!(
            "Speaker configured: {} symbols, cleaners {:?}, {} Hz",
            symbols.len(),
            model_config.text_cleaner_names(),
            model_config.sample_rate()
        );

        Ok(Self {
            options,
            model_config,
            symbols,
            normalizer,
            engine,
            init_gate: Mutex::new(()),
            state: AtomicU8::new(EngineState::Uninitialized as u8),
            volume: Mutex::new(None),
        })
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == EngineState::Ready
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Last volume successfully set through [`Speaker::set_volume`].
    pub fn volume(&self) -> Option<u8> {
        *self.volume.lock()
    }

    /// Parameters handed to the engine on initialization.
    pub fn engine_params(&self) -> EngineParams {
        let data = &self.model_config.data;
        EngineParams {
            sample_rate: data.sampling_rate,
            max_wav_value: data.max_wav_value,
            length_scale: self.options.length_scale.unwrap_or(data.length_scale),
            noise_scale: self.options.noise_scale.unwrap_or(data.noise_scale),
            noise_w: self.options.noise_w.unwrap_or(data.noise_w),
            single_speaker: self.options.single_speaker,
            num_threads: self.options.num_threads,
            audio_device_name: self.options.audio_device_name.clone(),
            audio_mixer_name: self.options.audio_mixer_name.clone(),
        }
    }

    /// Normalize `text` with the configured cleaners and encode it.
    pub fn text_to_phoneme_ids(&self, text: &str) -> Vec<i64> {
        let normalized = self.normalizer.normalize(text);
        self.symbols.encode(&normalized)
    }

    /// Synthesize `text` and play it through the engine's audio output.
    pub fn say(&self, text: &str, options: SayOptions) -> Result<SayResult, SpeakerError> {
        self.ensure_ready()?;
        let speaker_id = self.resolve_speaker(options.speaker.as_deref())?;
        let phoneme_ids = self.text_to_phoneme_ids(text);

        let timing = self
            .engine
            .say(&phoneme_ids, speaker_id, options.speech_rate, options.block)
            .map_err(SpeakerError::Synthesis)?;

        Ok(SayResult {
            infer_duration_ms: timing.infer_duration_ms,
            audio_duration_ms: timing.audio_duration_ms,
            real_time_factor: real_time_factor(timing.infer_duration_ms, timing.audio_duration_ms),
        })
    }

    /// Synthesize `text` and return the waveform without playing it.
    pub fn synthesize(
        &self,
        text: &str,
        options: SynthesizeOptions,
    ) -> Result<SynthesisResult, SpeakerError> {
        self.ensure_ready()?;
        let speaker_id = self.resolve_speaker(options.speaker.as_deref())?;
        let phoneme_ids = self.text_to_phoneme_ids(text);

        let audio = self
            .engine
            .synthesize(&phoneme_ids, speaker_id, options.speech_rate)
            .map_err(SpeakerError::Synthesis)?;
        let timing = audio.timing;

        Ok(SynthesisResult {
            samples: audio.samples,
            sample_rate: self.model_config.sample_rate(),
            infer_duration_ms: timing.infer_duration_ms,
            audio_duration_ms: timing.audio_duration_ms,
            real_time_factor: real_time_factor(timing.infer_duration_ms, timing.audio_duration_ms),
        })
    }

    /// Set the output volume as a percentage. Values above 100 are clamped.
    pub fn set_volume(&self, volume: u8) -> Result<(), SpeakerError> {
        self.ensure_ready()?;
        let volume = volume.min(MAX_VOLUME);
        self.engine
            .set_volume(volume)
            .map_err(SpeakerError::Synthesis)?;
        *self.volume.lock() = Some(volume);
        Ok(())
    }

    fn resolve_speaker(&self, name: Option<&str>) -> Result<i64, SpeakerError> {
        match name {
            None => Ok(DEFAULT_SPEAKER_ID),
            Some(name) => self
                .model_config
                .speaker_id(name)
                .ok_or_else(|| SpeakerError::UnknownSpeaker(name.to_string())),
        }
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Load the engine unless already loaded. Callers arriving while another
    /// thread initializes wait on the gate and then see `Ready`.
    fn ensure_ready(&self) -> Result<(), SpeakerError> {
        if self.is_ready() {
            return Ok(());
        }

        let _gate = self.init_gate.lock();
        if self.is_ready() {
            return Ok(());
        }

        self.set_state(EngineState::Initializing);
        log::info!(
            "Initializing speech engine from {}",
            self.options.model_path.display()
        );

        match self
            .engine
            .initialize(&self.options.model_path, &self.engine_params())
        {
            Ok(()) => {
                self.set_state(EngineState::Ready);
                log::info!("Speech engine ready");
                Ok(())
            }
            Err(err) => {
                self.set_state(EngineState::Uninitialized);
                log::warn!("Speech engine initialization failed: {err}");
                Err(SpeakerError::Initialization(err))
            }
        }
    }
}

fn validate_options(options: &SpeakerOptions) -> Result<(), ConfigError> {
    if !options.model_path.is_file() {
        return Err(ConfigError::ModelNotFound(options.model_path.clone()));
    }
    std::fs::File::open(&options.model_path).map_err(|source| ConfigError::Unreadable {
        path: options.model_path.clone(),
        source,
    })?;
    if !options.model_config_path.is_file() {
        return Err(ConfigError::ModelConfigNotFound(
            options.model_config_path.clone(),
        ));
    }
    if options.num_threads == 0 {
        return Err(ConfigError::InvalidThreads(options.num_threads));
    }

    let scales = [
        ("length_scale", options.length_scale),
        ("noise_scale", options.noise_scale),
        ("noise_w", options.noise_w),
    ];
    for (name, value) in scales {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidOptions(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::mandarin::tests::FixtureRomanizer;
    use crate::{EngineAudio, EngineTiming};
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Arc;
    use std::time::Duration;

    /// Counts calls and records arguments.
    #[derive(Default)]
    struct RecordingEngine {
        init_calls: AtomicUsize,
        say_calls: AtomicUsize,
        synthesize_calls: AtomicUsize,
        volume_calls: AtomicUsize,
        init_failures_left: AtomicUsize,
        fail_synthesis: AtomicBool,
        init_delay: Duration,
        timing: EngineTiming,
        last_ids: Mutex<Vec<i64>>,
        last_speaker: Mutex<Option<i64>>,
        last_speech_rate: Mutex<Option<f32>>,
        last_block: Mutex<Option<bool>>,
        last_volume: Mutex<Option<u8>>,
        last_params: Mutex<Option<EngineParams>>,
    }

    impl RecordingEngine {
        fn failing_init(times: usize) -> Self {
            let engine = Self::default();
            engine.init_failures_left.store(times, Ordering::SeqCst);
            engine
        }

        fn synthesis_failure(&self) -> Result<(), EngineError> {
            if self.fail_synthesis.load(Ordering::SeqCst) {
                return Err(EngineError::Backend("inference exploded".into()));
            }
            Ok(())
        }
    }

    impl SpeechEngine for RecordingEngine {
        fn initialize(&self, _model_path: &Path, params: &EngineParams) -> Result<(), EngineError> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.init_delay);
            *self.last_params.lock() = Some(params.clone());
            let failures = self.init_failures_left.load(Ordering::SeqCst);
            if failures > 0 {
                self.init_failures_left.store(failures - 1, Ordering::SeqCst);
                return Err(EngineError::Backend("model load failed".into()));
            }
            Ok(())
        }

        fn say(
            &self,
            phoneme_ids: &[i64],
            speaker_id: i64,
            speech_rate: f32,
            block: bool,
        ) -> Result<EngineTiming, EngineError> {
            self.say_calls.fetch_add(1, Ordering::SeqCst);
            self.synthesis_failure()?;
            *self.last_speech_rate.lock() = Some(speech_rate);
            *self.last_block.lock() = Some(block);
            *self.last_ids.lock() = phoneme_ids.to_vec();
            *self.last_speaker.lock() = Some(speaker_id);
            Ok(self.timing)
        }

        fn synthesize(
            &self,
            phoneme_ids: &[i64],
            speaker_id: i64,
            speech_rate: f32,
        ) -> Result<EngineAudio, EngineError> {
            self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
            self.synthesis_failure()?;
            *self.last_speech_rate.lock() = Some(speech_rate);
            *self.last_ids.lock() = phoneme_ids.to_vec();
            *self.last_speaker.lock() = Some(speaker_id);
            Ok(EngineAudio {
                samples: vec![0, 100, -100, 0],
                timing: self.timing,
            })
        }

        fn set_volume(&self, percent: u8) -> Result<(), EngineError> {
            self.volume_calls.fetch_add(1, Ordering::SeqCst);
            self.synthesis_failure()?;
            *self.last_volume.lock() = Some(percent);
            Ok(())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        options: SpeakerOptions,
    }

    fn fixture(config: serde_json::Value) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("moss.onnx");
        let config_path = dir.path().join("moss.json");
        std::fs::write(&model_path, b"onnx").unwrap();
        std::fs::write(&config_path, config.to_string()).unwrap();

        let options = SpeakerOptionsBuilder::default()
            .model_path(model_path)
            .model_config_path(config_path)
            .num_threads(2)
            .build()
            .unwrap();
        Fixture { _dir: dir, options }
    }

    fn model_config() -> serde_json::Value {
        json!({
            "data": {
                "sampling_rate": 22050,
                "max_wav_value": 32768.0,
                "text_cleaners": ["chinese_cleaners"]
            },
            "speakers": ["moss", "aria"],
            "symbols": ["_", "ㄋ", "ㄧ", "ˇ", "ㄏ", "ㄠ", "，"]
        })
    }

    fn speaker<E: SpeechEngine>(fixture: &Fixture, engine: E) -> Speaker<E> {
        Speaker::with_romanizer(fixture.options.clone(), engine, Box::new(FixtureRomanizer))
            .unwrap()
    }

    #[test]
    fn options_builder_applies_defaults() {
        let options = SpeakerOptionsBuilder::default()
            .model_path("m.onnx")
            .model_config_path("m.json")
            .num_threads(4)
            .length_scale(1.2)
            .build()
            .unwrap();
        assert_eq!(options.audio_device_name, "default");
        assert_eq!(options.audio_mixer_name, "PCM");
        assert!(!options.single_speaker);
        assert_eq!(options.length_scale, Some(1.2));
        assert_eq!(options.noise_scale, None);
    }

    #[test]
    fn options_builder_requires_paths() {
        assert!(SpeakerOptionsBuilder::default().num_threads(1).build().is_err());
    }

    #[test]
    fn missing_model_fails_before_any_engine_call() {
        let fixture = fixture(model_config());
        let mut options = fixture.options.clone();
        options.model_path = fixture._dir.path().join("missing.onnx");

        let engine = Arc::new(RecordingEngine::default());
        let result =
            Speaker::with_romanizer(options, Arc::clone(&engine), Box::new(FixtureRomanizer));

        assert!(matches!(
            result,
            Err(SpeakerError::Config(ConfigError::ModelNotFound(_)))
        ));
        assert_eq!(engine.init_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_config_is_rejected() {
        let fixture = fixture(model_config());
        let mut options = fixture.options.clone();
        options.model_config_path = fixture._dir.path().join("missing.json");
        let result = Speaker::with_romanizer(
            options,
            RecordingEngine::default(),
            Box::new(FixtureRomanizer),
        );
        assert!(matches!(
            result,
            Err(SpeakerError::Config(ConfigError::ModelConfigNotFound(_)))
        ));
    }

    #[test]
    fn zero_threads_are_rejected() {
        let fixture = fixture(model_config());
        let mut options = fixture.options.clone();
        options.num_threads = 0;
        let result = Speaker::with_romanizer(
            options,
            RecordingEngine::default(),
            Box::new(FixtureRomanizer),
        );
        assert!(matches!(
            result,
            Err(SpeakerError::Config(ConfigError::InvalidThreads(0)))
        ));
    }

    #[test]
    fn non_finite_scales_are_rejected() {
        let fixture = fixture(model_config());
        let mut options = fixture.options.clone();
        options.noise_w = Some(f32::NAN);
        let result = Speaker::with_romanizer(
            options,
            RecordingEngine::default(),
            Box::new(FixtureRomanizer),
        );
        assert!(matches!(
            result,
            Err(SpeakerError::Config(ConfigError::InvalidOptions(_)))
        ));
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let fixture = fixture(model_config());
        std::fs::write(&fixture.options.model_config_path, "{ not json").unwrap();
        let result = Speaker::with_romanizer(
            fixture.options.clone(),
            RecordingEngine::default(),
            Box::new(FixtureRomanizer),
        );
        assert!(matches!(
            result,
            Err(SpeakerError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn construction_does_not_initialize() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());
        assert_eq!(speaker.state(), EngineState::Uninitialized);
        assert_eq!(speaker.engine().init_calls.load(Ordering::SeqCst), 0);
        assert_eq!(speaker.symbols().len(), 7);
    }

    #[test]
    fn text_is_normalized_and_encoded() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());
        assert_eq!(
            speaker.text_to_phoneme_ids("你好"),
            vec![0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 3]
        );
    }

    #[test]
    fn say_initializes_once_and_passes_ids() {
        let fixture = fixture(model_config());
        let engine = RecordingEngine {
            timing: EngineTiming {
                infer_duration_ms: 850,
                audio_duration_ms: 1000,
            },
            ..Default::default()
        };
        let speaker = speaker(&fixture, engine);

        let result = speaker.say("你、好", SayOptions::default()).unwrap();
        assert_eq!(result.infer_duration_ms, 850);
        assert_eq!(result.audio_duration_ms, 1000);
        assert_eq!(result.real_time_factor, 0.85);
        assert_eq!(
            *speaker.engine().last_ids.lock(),
            vec![0, 1, 0, 2, 0, 3, 0, 6, 0, 4, 0, 5, 0, 3]
        );
        assert_eq!(*speaker.engine().last_speaker.lock(), Some(DEFAULT_SPEAKER_ID));

        speaker.say("你好", SayOptions::default()).unwrap();
        assert!(speaker.is_ready());
        assert_eq!(speaker.engine().init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(speaker.engine().say_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn add_blank_false_still_interleaves() {
        let mut config = model_config();
        config["data"]["add_blank"] = json!(false);
        let fixture = fixture(config);
        let speaker = speaker(&fixture, RecordingEngine::default());
        assert!(!speaker.model_config().add_blank());
        assert_eq!(speaker.text_to_phoneme_ids("好"), vec![0, 4, 0, 5, 0, 3]);
    }

    #[test]
    fn speech_rate_and_block_reach_the_engine_unchanged() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());

        let options = SayOptions {
            speech_rate: 3.0,
            block: true,
            ..Default::default()
        };
        speaker.say("你好", options).unwrap();
        assert_eq!(*speaker.engine().last_speech_rate.lock(), Some(3.0));
        assert_eq!(*speaker.engine().last_block.lock(), Some(true));

        speaker.say("你好", SayOptions::default()).unwrap();
        assert_eq!(*speaker.engine().last_speech_rate.lock(), Some(1.0));
        assert_eq!(*speaker.engine().last_block.lock(), Some(false));

        let options = SynthesizeOptions {
            speech_rate: 0.05,
            ..Default::default()
        };
        speaker.synthesize("你好", options).unwrap();
        assert_eq!(*speaker.engine().last_speech_rate.lock(), Some(0.05));
    }

    #[test]
    fn engine_receives_config_and_option_parameters() {
        let mut fixture = fixture(model_config());
        fixture.options.length_scale = Some(1.2);
        fixture.options.single_speaker = true;
        let speaker = speaker(&fixture, RecordingEngine::default());
        speaker.set_volume(100).unwrap();

        let params = speaker.engine().last_params.lock().clone().unwrap();
        assert_eq!(params.sample_rate, 22050);
        assert_eq!(params.max_wav_value, 32768.0);
        assert_eq!(params.length_scale, 1.2);
        assert_eq!(params.noise_scale, 0.667);
        assert_eq!(params.noise_w, 0.8);
        assert!(params.single_speaker);
        assert_eq!(params.num_threads, 2);
        assert_eq!(params.audio_device_name, "default");
        assert_eq!(params.audio_mixer_name, "PCM");
    }

    #[test]
    fn synthesize_returns_waveform_and_sample_rate() {
        let fixture = fixture(model_config());
        let engine = RecordingEngine {
            timing: EngineTiming {
                infer_duration_ms: 2,
                audio_duration_ms: 3,
            },
            ..Default::default()
        };
        let speaker = speaker(&fixture, engine);

        let result = speaker
            .synthesize("你好", SynthesizeOptions::default())
            .unwrap();
        assert_eq!(result.samples, vec![0, 100, -100, 0]);
        assert_eq!(result.sample_rate, 22050);
        assert_eq!(result.real_time_factor, 0.666);
        assert_eq!(speaker.engine().synthesize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(speaker.engine().say_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn named_speakers_are_resolved() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());

        let options = SynthesizeOptions {
            speaker: Some("aria".into()),
            ..Default::default()
        };
        speaker.synthesize("你好", options).unwrap();
        assert_eq!(*speaker.engine().last_speaker.lock(), Some(1));

        let options = SayOptions {
            speaker: Some("nobody".into()),
            ..Default::default()
        };
        assert!(matches!(
            speaker.say("你好", options),
            Err(SpeakerError::UnknownSpeaker(name)) if name == "nobody"
        ));
    }

    #[test]
    fn set_volume_caches_the_last_value() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());
        assert_eq!(speaker.volume(), None);

        speaker.set_volume(80).unwrap();
        speaker.set_volume(35).unwrap();
        assert_eq!(speaker.volume(), Some(35));
        assert_eq!(speaker.engine().volume_calls.load(Ordering::SeqCst), 2);
        assert_eq!(speaker.engine().init_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn volume_above_one_hundred_is_clamped() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());

        speaker.set_volume(200).unwrap();
        assert_eq!(speaker.volume(), Some(MAX_VOLUME));
        assert_eq!(*speaker.engine().last_volume.lock(), Some(MAX_VOLUME));
    }

    #[test]
    fn failed_initialization_can_be_retried() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::failing_init(1));

        let err = speaker.say("你好", SayOptions::default()).unwrap_err();
        assert!(matches!(err, SpeakerError::Initialization(_)));
        assert_eq!(speaker.state(), EngineState::Uninitialized);
        assert_eq!(speaker.engine().say_calls.load(Ordering::SeqCst), 0);

        speaker.say("你好", SayOptions::default()).unwrap();
        assert_eq!(speaker.state(), EngineState::Ready);
        assert_eq!(speaker.engine().init_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn synthesis_failure_keeps_engine_ready() {
        let fixture = fixture(model_config());
        let speaker = speaker(&fixture, RecordingEngine::default());
        speaker.set_volume(50).unwrap();

        speaker
            .engine()
            .fail_synthesis
            .store(true, Ordering::SeqCst);
        let err = speaker
            .synthesize("你好", SynthesizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, SpeakerError::Synthesis(_)));
        assert!(matches!(
            speaker.set_volume(10),
            Err(SpeakerError::Synthesis(_))
        ));
        assert_eq!(speaker.volume(), Some(50));
        assert_eq!(speaker.state(), EngineState::Ready);
        assert_eq!(speaker.engine().init_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_calls_initialize_once() {
        let fixture = fixture(model_config());
        let engine = RecordingEngine {
            init_delay: Duration::from_millis(50),
            ..Default::default()
        };
        let speaker = speaker(&fixture, engine);

        std::thread::scope(|scope| {
            let say = scope.spawn(|| speaker.say("你好", SayOptions::default()).map(|_| ()));
            let synthesize = scope.spawn(|| {
                speaker
                    .synthesize("你好", SynthesizeOptions::default())
                    .map(|_| ())
            });
            let volume = scope.spawn(|| speaker.set_volume(70));
            for handle in [say, synthesize, volume] {
                handle.join().unwrap().unwrap();
            }
        });

        assert_eq!(speaker.engine().init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(speaker.state(), EngineState::Ready);
    }

    #[test]
    fn real_time_factor_is_truncated() {
        assert_eq!(real_time_factor(850, 1000), 0.85);
        assert_eq!(real_time_factor(1234, 1000), 1.234);
        assert_eq!(real_time_factor(2, 3), 0.666);
        assert_eq!(real_time_factor(100, 0), 0.0);
    }
}
