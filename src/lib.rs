//! # vvcore-rs
//!
//! A Rust library providing text-to-speech synthesis through the VOICEVOX
//! CORE shared library.
//!
//! ## Features
//!
//! - **VOICEVOX TTS**: High-quality Japanese text-to-speech with multiple
//!   speakers and styles
//! - **Runtime Loading**: The core shared library is loaded at runtime from a
//!   path you supply; nothing is linked at build time
//! - **Speaker Metadata**: Enumerate speakers, styles, and supported devices
//!   straight from the loaded core
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! vvcore-rs = "0.1"
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use vvcore_rs::{engines::voicevox::VoicevoxEngine, SynthesisEngine};
//!
//! let mut engine = VoicevoxEngine::new();
//! engine.load_model(&PathBuf::from("voicevox_core/libcore.so"))?;
//!
//! let result = engine.synthesize("こんにちは", None)?;
//! result.write_wav(&PathBuf::from("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engines;

use std::io::Cursor;
use std::path::Path;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains a complete WAV byte stream as produced by the engine. The stream
/// is self-contained and can be written to disk or handed to an audio sink
/// as-is.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// WAV container bytes, including the header.
    pub wav: Vec<u8>,
}

impl SynthesisResult {
    /// Write the audio to a WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), std::io::Error> {
        std::fs::write(path, &self.wav)
    }

    /// Parse and return the WAV container header.
    pub fn spec(&self) -> Result<hound::WavSpec, hound::Error> {
        hound::WavReader::new(Cursor::new(&self.wav)).map(|r| r.spec())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> Result<f64, hound::Error> {
        let reader = hound::WavReader::new(Cursor::new(&self.wav))?;
        Ok(reader.duration() as f64 / reader.spec().sample_rate as f64)
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// This trait defines the standard operations that all synthesis engines must
/// support. Each engine may have different parameter types for model loading
/// and inference configuration.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (speaker, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading (threads, GPU, etc.)
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then
    /// `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path)?;
        Ok(())
    }
}
