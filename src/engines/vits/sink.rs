use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::EngineError;

/// Destination for synthesized PCM handed over by [`super::VitsEngine`].
pub trait AudioSink: Send + Sync {
    /// Play (or store) mono 16-bit samples. Blocks until done.
    fn play(&self, samples: &[i16], sample_rate: u32) -> Result<(), EngineError>;
}

/// Writes every utterance to `<dir>/utterance-NNNN.wav`.
pub struct WavFileSink {
    dir: PathBuf,
    next_index: AtomicUsize,
}

impl WavFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_index: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        self.dir.join(format!("utterance-{index:04}.wav"))
    }
}

impl AudioSink for WavFileSink {
    fn play(&self, samples: &[i16], sample_rate: u32) -> Result<(), EngineError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.next_path();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| EngineError::Playback(format!("{}: {e}", path.display())))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| EngineError::Playback(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EngineError::Playback(e.to_string()))?;

        log::debug!("Wrote {} samples to {}", samples.len(), path.display());
        Ok(())
    }
}
