//! VOICEVOX CORE text-to-speech engine implementation.
//!
//! This module binds the VOICEVOX CORE shared library: [`CoreApi`] mirrors
//! the library's C export table one-to-one, and [`VoicevoxEngine`] wraps it
//! with lifecycle management, error translation, and metadata decoding. The
//! synthesis pipeline itself (phoneme durations, pitch, vocoding) lives
//! entirely inside the native library.
//!
//! # System Requirements
//!
//! A VOICEVOX CORE distribution, downloadable from
//! <https://github.com/VOICEVOX/voicevox_core/releases>:
//! - the core shared library (`libcore.so` / `core.dll` / `libcore.dylib`)
//! - the ONNX Runtime library the core links against
//! - an Open JTalk dictionary directory (required for full TTS)
//!
//! # Directory Layout
//!
//! ```text
//! voicevox_core/
//! ├── libcore.so                      # core shared library
//! ├── libonnxruntime.so.1.13.1        # runtime, preloaded via runtime_path
//! ├── open_jtalk_dic_utf_8-1.11/      # text-analysis dictionary
//! └── model/                          # voice models, found via init_dir
//! ```
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use vvcore_rs::{SynthesisEngine, engines::voicevox::{VoicevoxEngine, VoicevoxModelParams}};
//! use std::path::PathBuf;
//!
//! let mut engine = VoicevoxEngine::new();
//! let params = VoicevoxModelParams {
//!     dict_dir: Some(PathBuf::from("voicevox_core/open_jtalk_dic_utf_8-1.11")),
//!     ..Default::default()
//! };
//! engine.load_model_with_params(&PathBuf::from("voicevox_core/libcore.so"), params)?;
//!
//! let result = engine.synthesize("こんにちは", None)?;
//! result.write_wav(&PathBuf::from("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Choosing a Speaker
//!
//! ```rust,no_run
//! use vvcore_rs::engines::voicevox::VoicevoxEngine;
//!
//! # let engine = VoicevoxEngine::new();
//! for speaker in engine.metas()? {
//!     for style in &speaker.styles {
//!         println!("{} ({}): id {}", speaker.name, style.name, style.id);
//!     }
//! }
//! let wav = engine.tts("こんにちは", 2)?;
//! # Ok::<(), vvcore_rs::engines::voicevox::VoicevoxError>(())
//! ```

pub mod core;
pub mod engine;
pub mod fault;
pub mod library;
pub mod metas;

#[cfg(test)]
pub(crate) mod stub;

pub use self::core::{CoreApi, VoicevoxError, WavBuffer};
pub use self::engine::{
    VoicevoxEngine, VoicevoxInferenceParams, VoicevoxModelParams, VoicevoxModelParamsBuilder,
};
pub use self::library::DynCore;
pub use self::metas::{SpeakerMeta, SpeakerStyle, SupportedDevices};
