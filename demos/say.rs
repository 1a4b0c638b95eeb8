use std::path::PathBuf;
use std::sync::Arc;

use speaker_rs::{
    engines::vits::{VitsEngine, WavFileSink},
    SayOptions, Speaker, SpeakerOptionsBuilder, SynthesizeOptions,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let model_dir = PathBuf::from("models/speaker");
    let options = SpeakerOptionsBuilder::default()
        .model_path(model_dir.join("moss.onnx"))
        .model_config_path(model_dir.join("moss.json"))
        .num_threads(4)
        .single_speaker(true)
        .build()?;

    // One speaker for the whole process, shared with every consumer.
    let engine = VitsEngine::with_sink(Arc::new(WavFileSink::new("output")));
    let speaker = Arc::new(Speaker::new(options, engine)?);

    let text = "让人类永远保持理智，的确是一种奢求";
    println!("Phoneme ids: {:?}", speaker.text_to_phoneme_ids(text));

    speaker.set_volume(100)?;
    let result = speaker.say(
        text,
        SayOptions {
            speech_rate: 0.8,
            block: true,
            ..Default::default()
        },
    )?;
    println!(
        "Played {} ms of audio, inference {} ms (RTF {})",
        result.audio_duration_ms, result.infer_duration_ms, result.real_time_factor
    );

    let worker = {
        let speaker = Arc::clone(&speaker);
        std::thread::spawn(move || {
            speaker.synthesize("今天是2024年，天气不错OK", SynthesizeOptions::default())
        })
    };
    let synthesized = worker.join().map_err(|_| "synthesis thread panicked")??;
    println!(
        "Synthesized {:.2}s of audio (RTF {})",
        synthesized.duration_secs(),
        synthesized.real_time_factor
    );

    synthesized.write_wav(&PathBuf::from("output.wav"))?;
    println!("Saved to output.wav");
    Ok(())
}
