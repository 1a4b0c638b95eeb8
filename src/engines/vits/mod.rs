//! VITS text-to-speech engine implementation.
//!
//! Runs a VITS checkpoint exported to ONNX. The graph takes already
//! encoded phoneme ids, so text normalization happens in
//! [`Speaker`](crate::Speaker) before the engine is called.
//!
//! # Model Inputs
//!
//! | Name | Shape | Type | Notes |
//! |---|---|---|---|
//! | `input` | `[1, N]` | i64 | blank-interleaved phoneme ids |
//! | `input_lengths` | `[1]` | i64 | `N` |
//! | `scales` | `[3]` | f32 | noise scale, length scale / speech rate, noise width |
//! | `sid` | `[1]` | i64 | multi-speaker models only |
//!
//! The single output is a float waveform, peak-normalized to the model's
//! `max_wav_value` and converted to 16-bit PCM.
//!
//! # Playback
//!
//! [`VitsEngine::say`](crate::SpeechEngine::say) hands PCM to an
//! [`AudioSink`]. [`WavFileSink`] writes one WAV file per utterance; device
//! output is left to the embedding application.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use speaker_rs::engines::vits::{VitsEngine, WavFileSink};
//! use speaker_rs::{Speaker, SpeakerOptionsBuilder, SayOptions};
//!
//! let options = SpeakerOptionsBuilder::default()
//!     .model_path("models/speaker/moss.onnx")
//!     .model_config_path("models/speaker/moss.json")
//!     .num_threads(4)
//!     .single_speaker(true)
//!     .build()?;
//!
//! let engine = VitsEngine::with_sink(Arc::new(WavFileSink::new("out")));
//! let speaker = Speaker::new(options, engine)?;
//! speaker.set_volume(100)?;
//! let result = speaker.say("让人类永远保持理智", SayOptions { block: true, ..Default::default() })?;
//! println!("real-time factor {}", result.real_time_factor);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod model;
pub mod sink;

pub use engine::VitsEngine;
pub use sink::{AudioSink, WavFileSink};
