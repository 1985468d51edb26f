//! Speech synthesis engines.
//!
//! This module contains implementations of text-to-speech engines.
//!
//! # Available Engines
//!
//! - `voicevox` - VOICEVOX CORE (native shared library, loaded at runtime)

pub mod voicevox;
