use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{EngineAudio, EngineError, EngineParams, EngineTiming, SpeechEngine};

use super::model::VitsModel;
use super::sink::AudioSink;

const FULL_VOLUME: u8 = 100;

/// ONNX Runtime VITS engine.
///
/// The session sits behind a mutex, so concurrent synthesis requests are
/// serialized here rather than by the caller.
///
/// # Quick Start
///
/// ```rust,no_run
/// use speaker_rs::{engines::vits::VitsEngine, SpeechEngine, EngineParams};
/// use std::path::Path;
///
/// let engine = VitsEngine::new();
/// let params = EngineParams {
///     sample_rate: 16000,
///     max_wav_value: 32768.0,
///     length_scale: 1.0,
///     noise_scale: 0.667,
///     noise_w: 0.8,
///     single_speaker: true,
///     num_threads: 4,
///     audio_device_name: "default".into(),
///     audio_mixer_name: "PCM".into(),
/// };
/// engine.initialize(Path::new("models/speaker/moss.onnx"), &params)?;
/// let audio = engine.synthesize(&[0, 47, 0, 11, 0, 28], 0, 1.0)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct VitsEngine {
    model: Mutex<Option<VitsModel>>,
    sink: Option<Arc<dyn AudioSink>>,
    volume: AtomicU8,
}

impl Default for VitsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VitsEngine {
    /// Create an engine without audio output. `say` fails until a sink is
    /// configured; `synthesize` works.
    pub fn new() -> Self {
        Self {
            model: Mutex::new(None),
            sink: None,
            volume: AtomicU8::new(FULL_VOLUME),
        }
    }

    /// Create an engine that plays through `sink`.
    pub fn with_sink(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.lock().is_some()
    }

    /// Drop the ONNX session.
    pub fn unload(&self) {
        *self.model.lock() = None;
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Acquire)
    }

    fn run(
        &self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
    ) -> Result<(EngineAudio, u32), EngineError> {
        let mut model = self.model.lock();
        let model = model.as_mut().ok_or(EngineError::NotInitialized)?;
        let audio = model.synthesize(phoneme_ids, speaker_id, speech_rate)?;
        Ok((audio, model.sample_rate()))
    }
}

impl SpeechEngine for VitsEngine {
    fn initialize(&self, model_path: &Path, params: &EngineParams) -> Result<(), EngineError> {
        let model = VitsModel::load(model_path, params)?;
        *self.model.lock() = Some(model);
        if self.sink.is_none() {
            log::warn!(
                "No audio sink configured; say() will fail (device '{}', mixer '{}')",
                params.audio_device_name,
                params.audio_mixer_name
            );
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
        let sink = self
            .sink
            .clone()
            .ok_or_else(|| EngineError::Playback("no audio sink configured".to_string()))?;

        let (audio, sample_rate) = self.run(phoneme_ids, speaker_id, speech_rate)?;
        let samples = apply_volume(audio.samples, self.volume());

        if block {
            sink.play(&samples, sample_rate)?;
        } else {
            std::thread::spawn(move || {
                if let Err(e) = sink.play(&samples, sample_rate) {
                    log::warn!("Background playback failed: {e}");
                }
            });
        }

        Ok(audio.timing)
    }

    fn synthesize(
        &self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
    ) -> Result<EngineAudio, EngineError> {
        self.run(phoneme_ids, speaker_id, speech_rate)
            .map(|(audio, _)| audio)
    }

    fn set_volume(&self, percent: u8) -> Result<(), EngineError> {
        if !self.is_loaded() {
            return Err(EngineError::NotInitialized);
        }
        self.volume
            .store(percent.min(FULL_VOLUME), Ordering::Release);
        Ok(())
    }
}

/// Scale samples by `percent` / 100.
pub fn apply_volume(mut samples: Vec<i16>, percent: u8) -> Vec<i16> {
    if percent >= FULL_VOLUME {
        return samples;
    }
    let gain = f32::from(percent) / f32::from(FULL_VOLUME);
    for sample in &mut samples {
        *sample = (f32::from(*sample) * gain).round() as i16;
    }
    samples
}
