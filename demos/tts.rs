use std::path::PathBuf;
use std::time::Instant;

use vvcore_rs::{
    engines::voicevox::{VoicevoxEngine, VoicevoxInferenceParams, VoicevoxModelParams},
    SynthesisEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let library_path = PathBuf::from(
        args.next()
            .unwrap_or_else(|| "voicevox_core/libcore.so".to_string()),
    );
    let dict_dir = PathBuf::from(
        args.next()
            .unwrap_or_else(|| "voicevox_core/open_jtalk_dic_utf_8-1.11".to_string()),
    );

    let mut engine = VoicevoxEngine::new();
    let params = VoicevoxModelParams {
        dict_dir: Some(dict_dir),
        ..Default::default()
    };

    let load_start = Instant::now();
    engine.load_model_with_params(&library_path, params)?;
    println!("Core loaded in {:.2?}", load_start.elapsed());

    for speaker in engine.metas()? {
        for style in &speaker.styles {
            println!("{} ({}): id {}", speaker.name, style.name, style.id);
        }
    }
    println!("Devices: {:?}", engine.supported_devices()?);

    let text = "こんにちは、音声合成の世界へようこそ";
    let params = VoicevoxInferenceParams { speaker_id: 2 };

    let synth_start = Instant::now();
    let result = engine.synthesize(text, Some(params))?;
    println!(
        "Synthesized {} bytes ({:.2}s audio) in {:.2?}",
        result.wav.len(),
        result.duration_secs()?,
        synth_start.elapsed()
    );

    result.write_wav(&PathBuf::from("output.wav"))?;
    println!("Saved to output.wav");

    engine.unload_model();
    Ok(())
}
