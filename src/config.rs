//! Model configuration shipped next to a VITS checkpoint.
//!
//! ```json
//! {
//!   "data": {
//!     "sampling_rate": 22050,
//!     "max_wav_value": 32768.0,
//!     "add_blank": true,
//!     "n_speakers": 1,
//!     "text_cleaners": ["chinese_cleaners"]
//!   },
//!   "speakers": ["moss"],
//!   "symbols": ["_", "，", "。", "ㄅ", "..."]
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_SAMPLE_RATE: u32 = 16000;
pub const DEFAULT_MAX_WAV_VALUE: f32 = 32768.0;
pub const DEFAULT_LENGTH_SCALE: f32 = 1.0;
pub const DEFAULT_NOISE_SCALE: f32 = 0.667;
pub const DEFAULT_NOISE_W: f32 = 0.8;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("model config file not found: {}", .0.display())]
    ModelConfigNotFound(PathBuf),
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid model config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("inference num threads invalid: {0}")]
    InvalidThreads(usize),
    #[error("Invalid speaker options: {0}")]
    InvalidOptions(String),
}

/// Parsed model configuration. Read-only once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    speakers: Option<SpeakerNames>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// The `data` section of the model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_sample_rate")]
    pub sampling_rate: u32,
    #[serde(default = "default_max_wav_value")]
    pub max_wav_value: f32,
    /// Informational; encoding always interleaves blanks.
    #[serde(default = "default_add_blank")]
    pub add_blank: bool,
    #[serde(default = "default_n_speakers")]
    pub n_speakers: u32,
    #[serde(default)]
    pub text_cleaners: Vec<String>,
    #[serde(default = "default_length_scale")]
    pub length_scale: f32,
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,
    #[serde(default = "default_noise_w")]
    pub noise_w: f32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLE_RATE,
            max_wav_value: DEFAULT_MAX_WAV_VALUE,
            add_blank: true,
            n_speakers: 1,
            text_cleaners: Vec::new(),
            length_scale: DEFAULT_LENGTH_SCALE,
            noise_scale: DEFAULT_NOISE_SCALE,
            noise_w: DEFAULT_NOISE_W,
        }
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_max_wav_value() -> f32 {
    DEFAULT_MAX_WAV_VALUE
}

fn default_add_blank() -> bool {
    true
}

fn default_n_speakers() -> u32 {
    1
}

fn default_length_scale() -> f32 {
    DEFAULT_LENGTH_SCALE
}

fn default_noise_scale() -> f32 {
    DEFAULT_NOISE_SCALE
}

fn default_noise_w() -> f32 {
    DEFAULT_NOISE_W
}

/// Speakers are listed either positionally or as an explicit name → index map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SpeakerNames {
    List(Vec<String>),
    Map(HashMap<String, i64>),
}

impl ModelConfig {
    /// Load and parse a model configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build from already-parsed structured data.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn sample_rate(&self) -> u32 {
        self.data.sampling_rate
    }

    pub fn max_wav_value(&self) -> f32 {
        self.data.max_wav_value
    }

    pub fn add_blank(&self) -> bool {
        self.data.add_blank
    }

    pub fn n_speakers(&self) -> u32 {
        self.data.n_speakers
    }

    pub fn text_cleaner_names(&self) -> &[String] {
        &self.data.text_cleaners
    }

    /// Speaker name → index map. Empty when the config lists no speakers.
    pub fn speakers(&self) -> HashMap<String, i64> {
        match &self.speakers {
            Some(SpeakerNames::List(names)) => names
                .iter()
                .enumerate()
                .map(|(index, name)| (name.clone(), index as i64))
                .collect(),
            Some(SpeakerNames::Map(map)) => map.clone(),
            None => HashMap::new(),
        }
    }

    pub fn speaker_id(&self, name: &str) -> Option<i64> {
        match &self.speakers {
            Some(SpeakerNames::List(names)) => names
                .iter()
                .position(|candidate| candidate == name)
                .map(|index| index as i64),
            Some(SpeakerNames::Map(map)) => map.get(name).copied(),
            None => None,
        }
    }
}
