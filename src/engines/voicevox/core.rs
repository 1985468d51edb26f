//! Low-level interface to the VOICEVOX CORE C ABI.
//!
//! [`CoreApi`] is a typed mirror of the export table of the core shared
//! library: one method per export, with the exact argument and return types
//! of the C functions, and no behavior beyond the call itself. The rest of
//! the crate depends on this trait rather than on the loading mechanism, so
//! the engine can run against [`DynCore`](super::library::DynCore) in
//! production and an in-process stub in tests.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

/// Errors produced by the VOICEVOX engine.
#[derive(thiserror::Error, Debug)]
pub enum VoicevoxError {
    #[error("Failed to load the core library: {0}")]
    Load(#[from] libloading::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Core initialization failed: {0}")]
    Initialize(String),
    #[error("Open JTalk initialization failed: {0}")]
    OpenJtalk(String),
    #[error("Synthesis failed: {0}")]
    Synthesis(String),
    #[error("Invalid metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("Core returned invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("String contains an interior NUL byte: {0}")]
    Nul(#[from] std::ffi::NulError),
    #[error("{0} returned a null pointer")]
    NullPointer(&'static str),
    #[error("Core library not loaded. Call load_model() first.")]
    NotLoaded,
}

/// The export table of the VOICEVOX CORE shared library.
///
/// Every method forwards to the identically-typed native export and returns
/// its result unchanged. No method validates its arguments; the native
/// library defines all failure behavior, up to and including a process fault
/// when a buffer contract is violated.
///
/// The inference calls (`yukarin_s_forward`, `yukarin_sa_forward`,
/// `decode_forward`) report failure through their boolean return value only;
/// the message behind a `false` is available from
/// [`CoreApi::last_error_message`]. The text-analysis and TTS calls return an
/// integer result code instead, translatable through
/// [`CoreApi::error_result_to_message`].
pub trait CoreApi {
    /// Native `initialize`. Must precede all inference calls.
    ///
    /// # Safety
    ///
    /// `root_dir_path` must be a valid NUL-terminated string pointer.
    unsafe fn initialize(
        &self,
        root_dir_path: *const c_char,
        use_gpu: bool,
        cpu_num_threads: c_int,
    ) -> bool;

    /// Native `finalize`. Resets internal native state; idempotent and
    /// repeatable. Does not unload the library.
    ///
    /// # Safety
    ///
    /// The core must have been loaded; no other thread may be inside a core
    /// call.
    unsafe fn finalize(&self);

    /// Native `metas`. Returns speaker metadata as a JSON byte string owned
    /// by the core.
    ///
    /// # Safety
    ///
    /// The returned pointer is only valid while the core remains loaded.
    unsafe fn metas(&self) -> *const c_char;

    /// Native `supported_devices`. Returns device availability as a JSON
    /// byte string owned by the core.
    ///
    /// # Safety
    ///
    /// The returned pointer is only valid while the core remains loaded.
    unsafe fn supported_devices(&self) -> *const c_char;

    /// Native `yukarin_s_forward`: phoneme-duration inference.
    ///
    /// # Safety
    ///
    /// `phoneme_list` and `speaker_id` must point to `length` and 1 readable
    /// `i64` values; `output` must point to `length` writable `f32` slots.
    unsafe fn yukarin_s_forward(
        &self,
        length: i64,
        phoneme_list: *const i64,
        speaker_id: *const i64,
        output: *mut f32,
    ) -> bool;

    /// Native `yukarin_sa_forward`: mora pitch inference from phoneme and
    /// accent sequences.
    ///
    /// # Safety
    ///
    /// All six sequence pointers must point to `length` readable `i64`
    /// values, `speaker_id` to 1, and `output` to `length` writable `f32`
    /// slots.
    #[allow(clippy::too_many_arguments)]
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
    ) -> bool;

    /// Native `decode_forward`: waveform decode from per-frame pitch and
    /// phoneme data.
    ///
    /// # Safety
    ///
    /// `f0` must point to `length` readable `f32` values, `phoneme` to
    /// `length * phoneme_size`, `speaker_id` to 1 readable `i64`, and
    /// `output` to `length * 256` writable `f32` slots.
    unsafe fn decode_forward(
        &self,
        length: i64,
        phoneme_size: i64,
        f0: *const f32,
        phoneme: *const f32,
        speaker_id: *const i64,
        output: *mut f32,
    ) -> bool;

    /// Native `last_error_message`: describes the most recent failure of an
    /// inference call.
    ///
    /// # Safety
    ///
    /// The returned pointer is only valid while the core remains loaded.
    unsafe fn last_error_message(&self) -> *const c_char;

    /// Native `voicevox_initialize_openjtalk`: initializes the text-analysis
    /// subsystem from a dictionary directory. Returns a result code, 0 on
    /// success.
    ///
    /// # Safety
    ///
    /// `dict_path` must be a valid NUL-terminated string pointer.
    unsafe fn initialize_openjtalk(&self, dict_path: *const c_char) -> c_int;

    /// Native `voicevox_tts`: full text-to-speech. On success the core
    /// allocates a WAV buffer and stores its address and size through the
    /// output parameters. Returns a result code, 0 on success.
    ///
    /// # Safety
    ///
    /// `text` must be a valid NUL-terminated string pointer and both output
    /// pointers must be writable. A buffer stored through `output_wav` must
    /// later be released with [`wav_free`](CoreApi::wav_free), exactly once.
    unsafe fn tts(
        &self,
        text: *const c_char,
        speaker_id: i64,
        output_binary_size: *mut c_int,
        output_wav: *mut *mut u8,
    ) -> c_int;

    /// Native `voicevox_wav_free`: releases a buffer produced by
    /// [`tts`](CoreApi::tts).
    ///
    /// # Safety
    ///
    /// `wav` must be a buffer obtained from `tts` that has not already been
    /// freed.
    unsafe fn wav_free(&self, wav: *mut u8);

    /// Native `voicevox_error_result_to_message`: translates a result code
    /// into a human-readable byte string owned by the core.
    ///
    /// # Safety
    ///
    /// The returned pointer is only valid while the core remains loaded.
    unsafe fn error_result_to_message(&self, result_code: c_int) -> *const c_char;
}

/// An owned handle over a WAV buffer allocated by the core.
///
/// The buffer is released through [`CoreApi::wav_free`] exactly once: either
/// when [`take`](WavBuffer::take) consumes the handle after copying the bytes
/// out, or when the handle is dropped untaken (the failure path). A null
/// pointer means the core produced no buffer, and nothing is freed.
pub struct WavBuffer<'a> {
    api: &'a dyn CoreApi,
    ptr: *mut u8,
    len: usize,
}

impl<'a> WavBuffer<'a> {
    /// Wrap a buffer pointer and byte count returned by [`CoreApi::tts`].
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live buffer of at least `len` bytes allocated
    /// by `api`, owned by no other handle.
    pub unsafe fn from_raw(api: &'a dyn CoreApi, ptr: *mut u8, len: usize) -> Self {
        Self { api, ptr, len }
    }

    /// Number of bytes reported by the core for this buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the core produced no buffer or an empty one.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }

    /// Copy the buffer contents into a host-owned vector and release the
    /// native buffer.
    pub fn take(self) -> Vec<u8> {
        if self.ptr.is_null() {
            return Vec::new();
        }
        // copy first; dropping self afterwards releases the native buffer
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }.to_vec()
    }
}

impl Drop for WavBuffer<'_> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { self.api.wav_free(self.ptr) };
        }
    }
}

/// Decode a core-owned C string into an owned `String`.
///
/// `source` names the export that produced the pointer, for the null-pointer
/// error message.
///
/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string pointer.
pub(crate) unsafe fn decode_cstr(
    ptr: *const c_char,
    source: &'static str,
) -> Result<String, VoicevoxError> {
    if ptr.is_null() {
        return Err(VoicevoxError::NullPointer(source));
    }
    Ok(CStr::from_ptr(ptr).to_str()?.to_owned())
}
