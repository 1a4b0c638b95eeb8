use std::path::Path;
use std::time::Instant;

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use crate::{EngineAudio, EngineError, EngineParams, EngineTiming};

/// Lower bound on the waveform peak used for normalization.
const MIN_PEAK: f32 = 0.01;

/// Loaded VITS ONNX session plus the parameters it was loaded with.
pub struct VitsModel {
    session: Session,
    params: EngineParams,
}

impl VitsModel {
    pub fn load(model_path: &Path, params: &EngineParams) -> Result<Self, EngineError> {
        if !model_path.is_file() {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No ONNX model at {}", model_path.display()),
            )));
        }
        log::info!("Loading VITS model from {}", model_path.display());

        let session = init_session(model_path, params.num_threads)?;
        log::info!(
            "VITS model loaded: {} Hz, single_speaker={}",
            params.sample_rate,
            params.single_speaker
        );

        Ok(Self {
            session,
            params: params.clone(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.params.sample_rate
    }

    /// Run inference on one blank-interleaved phoneme id sequence.
    pub fn synthesize(
        &mut self,
        phoneme_ids: &[i64],
        speaker_id: i64,
        speech_rate: f32,
    ) -> Result<EngineAudio, EngineError> {
        if phoneme_ids.is_empty() {
            log::warn!("No phoneme ids to synthesize");
            return Ok(EngineAudio::default());
        }

        let len = phoneme_ids.len();
        let input = Array2::from_shape_vec((1, len), phoneme_ids.to_vec())?;
        let input_lengths = ndarray::arr1(&[len as i64]);
        let scales = ndarray::arr1(&[
            self.params.noise_scale,
            self.params.length_scale / speech_rate,
            self.params.noise_w,
        ]);

        let start = Instant::now();
        let output = if self.params.single_speaker {
            let inputs = inputs![
                "input" => TensorRef::from_array_view(input.view())?,
                "input_lengths" => TensorRef::from_array_view(input_lengths.view())?,
                "scales" => TensorRef::from_array_view(scales.view())?,
            ];
            self.session.run(inputs)?
        } else {
            let sid = ndarray::arr1(&[speaker_id]);
            let inputs = inputs![
                "input" => TensorRef::from_array_view(input.view())?,
                "input_lengths" => TensorRef::from_array_view(input_lengths.view())?,
                "scales" => TensorRef::from_array_view(scales.view())?,
                "sid" => TensorRef::from_array_view(sid.view())?,
            ];
            self.session.run(inputs)?
        };
        let infer_duration = start.elapsed();

        let first_output = output
            .iter()
            .next()
            .ok_or_else(|| EngineError::Backend("No output from model".to_string()))?;
        let waveform = first_output.1.try_extract_array::<f32>()?;
        let waveform: Vec<f32> = waveform.iter().copied().collect();

        let timing = EngineTiming {
            infer_duration_ms: infer_duration.as_millis().min(u32::MAX as u128) as u32,
            audio_duration_ms: duration_ms(waveform.len(), self.params.sample_rate),
        };
        log::debug!(
            "VITS produced {} samples in {} ms",
            waveform.len(),
            timing.infer_duration_ms
        );

        Ok(EngineAudio {
            samples: to_pcm(&waveform, self.params.max_wav_value),
            timing,
        })
    }
}

/// Build an ONNX session with the requested intra-op thread count.
fn init_session(onnx_path: &Path, num_threads: usize) -> Result<Session, EngineError> {
    let providers = vec![CPUExecutionProvider::default().build()];

    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(providers)?;

    if num_threads > 0 {
        builder = builder.with_intra_threads(num_threads)?;
    }

    Ok(builder.commit_from_file(onnx_path)?)
}

/// Milliseconds of audio in `samples` at `sample_rate`.
pub fn duration_ms(samples: usize, sample_rate: u32) -> u32 {
    if sample_rate == 0 {
        return 0;
    }
    (samples as u64 * 1000 / u64::from(sample_rate)).min(u64::from(u32::MAX)) as u32
}

/// Peak-normalize a float waveform to `max_wav_value` and clamp to i16.
pub fn to_pcm(waveform: &[f32], max_wav_value: f32) -> Vec<i16> {
    let peak = waveform
        .iter()
        .fold(MIN_PEAK, |peak, sample| peak.max(sample.abs()));
    let scale = max_wav_value / peak;
    waveform
        .iter()
        .map(|&sample| (sample * scale).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_is_peak_normalized_and_clamped() {
        let pcm = to_pcm(&[0.0, 0.5, -0.25, -0.5], 32768.0);
        assert_eq!(pcm, vec![0, i16::MAX, -16384, i16::MIN]);
    }

    #[test]
    fn quiet_audio_is_not_over_amplified() {
        let pcm = to_pcm(&[0.00125, -0.00125], 100.0);
        assert_eq!(pcm, vec![12, -12]);
    }

    #[test]
    fn durations_are_in_milliseconds() {
        assert_eq!(duration_ms(22050, 22050), 1000);
        assert_eq!(duration_ms(8000, 16000), 500);
        assert_eq!(duration_ms(100, 0), 0);
    }

    #[test]
    fn loading_a_missing_model_fails() {
        let params = EngineParams {
            sample_rate: 16000,
            max_wav_value: 32768.0,
            length_scale: 1.0,
            noise_scale: 0.667,
            noise_w: 0.8,
            single_speaker: true,
            num_threads: 1,
            audio_device_name: "default".into(),
            audio_mixer_name: "PCM".into(),
        };
        let result = VitsModel::load(Path::new("/nonexistent/moss.onnx"), &params);
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
