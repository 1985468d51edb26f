//! Runtime loading of the VOICEVOX CORE shared library.
//!
//! [`DynCore`] resolves every export once at load time into typed function
//! pointers and keeps the [`Library`] handle alive for as long as the struct
//! exists, so the pointers stay valid. An optional runtime library (e.g.
//! ONNX Runtime) can be preloaded first for cores that link against it
//! dynamically.

use std::os::raw::{c_char, c_int};
use std::path::Path;

use libloading::{Library, Symbol};

use super::core::{CoreApi, VoicevoxError};

type InitializeFn = unsafe extern "C" fn(*const c_char, bool, c_int) -> bool;
type FinalizeFn = unsafe extern "C" fn();
type TextFn = unsafe extern "C" fn() -> *const c_char;
type YukarinSForwardFn = unsafe extern "C" fn(i64, *const i64, *const i64, *mut f32) -> bool;
type YukarinSaForwardFn = unsafe extern "C" fn(
    i64,
    *const i64,
    *const i64,
    *const i64,
    *const i64,
    *const i64,
    *const i64,
    *const i64,
    *mut f32,
) -> bool;
type DecodeForwardFn =
    unsafe extern "C" fn(i64, i64, *const f32, *const f32, *const i64, *mut f32) -> bool;
type InitializeOpenJtalkFn = unsafe extern "C" fn(*const c_char) -> c_int;
type TtsFn = unsafe extern "C" fn(*const c_char, i64, *mut c_int, *mut *mut u8) -> c_int;
type WavFreeFn = unsafe extern "C" fn(*mut u8);
type ErrorResultToMessageFn = unsafe extern "C" fn(c_int) -> *const c_char;

/// The loaded core library with its export table resolved.
pub struct DynCore {
    initialize: InitializeFn,
    finalize: FinalizeFn,
    metas: TextFn,
    supported_devices: TextFn,
    yukarin_s_forward: YukarinSForwardFn,
    yukarin_sa_forward: YukarinSaForwardFn,
    decode_forward: DecodeForwardFn,
    last_error_message: TextFn,
    initialize_openjtalk: InitializeOpenJtalkFn,
    tts: TtsFn,
    wav_free: WavFreeFn,
    error_result_to_message: ErrorResultToMessageFn,
    // Field order doubles as drop order: the core library unloads before the
    // runtime it links against.
    _library: Library,
    _runtime: Option<Library>,
}

fn resolve<T: Copy>(library: &Library, name: &[u8]) -> Result<T, VoicevoxError> {
    let symbol: Symbol<T> = unsafe { library.get(name) }?;
    Ok(*symbol)
}

impl DynCore {
    /// Load the core library from `path`, preloading `runtime_path` first if
    /// given. Fails if either library cannot be loaded or any expected
    /// export is missing.
    pub fn load(path: &Path, runtime_path: Option<&Path>) -> Result<Self, VoicevoxError> {
        let runtime = match runtime_path {
            Some(runtime_path) => {
                let runtime = unsafe { Library::new(runtime_path) }?;
                log::info!("Preloaded runtime library {}", runtime_path.display());
                Some(runtime)
            }
            None => None,
        };

        let library = unsafe { Library::new(path) }?;
        let core = Self {
            initialize: resolve(&library, b"initialize\0")?,
            finalize: resolve(&library, b"finalize\0")?,
            metas: resolve(&library, b"metas\0")?,
            supported_devices: resolve(&library, b"supported_devices\0")?,
            yukarin_s_forward: resolve(&library, b"yukarin_s_forward\0")?,
            yukarin_sa_forward: resolve(&library, b"yukarin_sa_forward\0")?,
            decode_forward: resolve(&library, b"decode_forward\0")?,
            last_error_message: resolve(&library, b"last_error_message\0")?,
            initialize_openjtalk: resolve(&library, b"voicevox_initialize_openjtalk\0")?,
            tts: resolve(&library, b"voicevox_tts\0")?,
            wav_free: resolve(&library, b"voicevox_wav_free\0")?,
            error_result_to_message: resolve(&library, b"voicevox_error_result_to_message\0")?,
            _library: library,
            _runtime: runtime,
        };
        log::info!("Loaded VOICEVOX CORE from {}", path.display());
        Ok(core)
    }
}

impl CoreApi for DynCore {
    unsafe fn initialize(
        &self,
        root_dir_path: *const c_char,
        use_gpu: bool,
        cpu_num_threads: c_int,
    ) -> bool {
        (self.initialize)(root_dir_path, use_gpu, cpu_num_threads)
    }

    unsafe fn finalize(&self) {
        (self.finalize)()
    }

    unsafe fn metas(&self) -> *const c_char {
        (self.metas)()
    }

    unsafe fn supported_devices(&self) -> *const c_char {
        (self.supported_devices)()
    }

    unsafe fn yukarin_s_forward(
        &self,
        length: i64,
        phoneme_list: *const i64,
        speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        (self.yukarin_s_forward)(length, phoneme_list, speaker_id, output)
    }

    unsafe fn yukarin_sa_forward(
        &self,
        length: i64,
        vowel_phoneme_list: *const i64,
        consonant_phoneme_list: *const i64,
        start_accent_list: *const i64,
        end_accent_list: *const i64,
        start_accent_phrase_list: *const i64,
        end_accent_phrase_list: *const i64,
        speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        (self.yukarin_sa_forward)(
            length,
            vowel_phoneme_list,
            consonant_phoneme_list,
            start_accent_list,
            end_accent_list,
            start_accent_phrase_list,
            end_accent_phrase_list,
            speaker_id,
            output,
        )
    }

    unsafe fn decode_forward(
        &self,
        length: i64,
        phoneme_size: i64,
        f0: *const f32,
        phoneme: *const f32,
        speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        (self.decode_forward)(length, phoneme_size, f0, phoneme, speaker_id, output)
    }

    unsafe fn last_error_message(&self) -> *const c_char {
        (self.last_error_message)()
    }

    unsafe fn initialize_openjtalk(&self, dict_path: *const c_char) -> c_int {
        (self.initialize_openjtalk)(dict_path)
    }

    unsafe fn tts(
        &self,
        text: *const c_char,
        speaker_id: i64,
        output_binary_size: *mut c_int,
        output_wav: *mut *mut u8,
    ) -> c_int {
        (self.tts)(text, speaker_id, output_binary_size, output_wav)
    }

    unsafe fn wav_free(&self, wav: *mut u8) {
        (self.wav_free)(wav)
    }

    unsafe fn error_result_to_message(&self, result_code: c_int) -> *const c_char {
        (self.error_result_to_message)(result_code)
    }
}
