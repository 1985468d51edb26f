//! Instrumented in-process stand-in for the core shared library.
//!
//! `StubCore` implements [`CoreApi`] entirely in Rust so the engine can be
//! tested without a real core build. It allocates TTS buffers the way the
//! native side does (ownership passes to the caller until `wav_free`) and
//! counts every lifecycle call, so tests can assert the exactly-once release
//! discipline. Freeing null, an unknown pointer, or the same buffer twice
//! panics the test.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::core::CoreApi;

pub(crate) const UNKNOWN_SPEAKER_CODE: c_int = 2;

pub(crate) struct StubCore {
    pub init_result: bool,
    pub forward_result: bool,
    pub openjtalk_result: c_int,
    pub tts_result: c_int,
    /// Speaker ids the stub accepts; others fail with `UNKNOWN_SPEAKER_CODE`.
    pub known_speakers: Vec<i64>,
    /// When true, a failing `tts` still allocates a (partial) buffer, which
    /// the caller must release.
    pub fail_allocates_buffer: bool,
    pub wav_bytes: Vec<u8>,
    metas_json: Mutex<CString>,
    devices_json: Mutex<CString>,
    last_error: Mutex<CString>,
    code_messages: Vec<(c_int, CString)>,
    unknown_code_message: CString,
    initialize_calls: AtomicUsize,
    finalize_calls: AtomicUsize,
    openjtalk_calls: AtomicUsize,
    tts_calls: AtomicUsize,
    free_calls: AtomicUsize,
    live_buffers: Mutex<Vec<(usize, usize)>>,
}

impl StubCore {
    pub fn new() -> Self {
        Self {
            init_result: true,
            forward_result: true,
            openjtalk_result: 0,
            tts_result: 0,
            known_speakers: vec![0, 2],
            fail_allocates_buffer: false,
            wav_bytes: b"RIFF".to_vec(),
            metas_json: Mutex::new(
                CString::new(
                    r#"[{"name":"四国めたん","speaker_uuid":"7ffcb7ce-00ec-4bdc-82cd-45a8889e43ff","styles":[{"name":"あまあま","id":0},{"name":"ノーマル","id":2}],"version":"0.14.0"}]"#,
                )
                .unwrap(),
            ),
            devices_json: Mutex::new(
                CString::new(r#"{"cpu":true,"cuda":false,"dml":false}"#).unwrap(),
            ),
            last_error: Mutex::new(CString::new("stub: no error").unwrap()),
            code_messages: vec![
                (1, CString::new("failed to load the Open JTalk dictionary").unwrap()),
                (
                    UNKNOWN_SPEAKER_CODE,
                    CString::new("unknown speaker id").unwrap(),
                ),
            ],
            unknown_code_message: CString::new("unknown result code").unwrap(),
            initialize_calls: AtomicUsize::new(0),
            finalize_calls: AtomicUsize::new(0),
            openjtalk_calls: AtomicUsize::new(0),
            tts_calls: AtomicUsize::new(0),
            free_calls: AtomicUsize::new(0),
            live_buffers: Mutex::new(Vec::new()),
        }
    }

    pub fn set_last_error(&self, message: &str) {
        *self.last_error.lock().unwrap() = CString::new(message).unwrap();
    }

    pub fn set_metas_json(&self, json: &str) {
        *self.metas_json.lock().unwrap() = CString::new(json).unwrap();
    }

    pub fn set_devices_json(&self, json: &str) {
        *self.devices_json.lock().unwrap() = CString::new(json).unwrap();
    }

    pub fn initialize_count(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn finalize_count(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }

    pub fn openjtalk_count(&self) -> usize {
        self.openjtalk_calls.load(Ordering::SeqCst)
    }

    pub fn tts_count(&self) -> usize {
        self.tts_calls.load(Ordering::SeqCst)
    }

    pub fn free_count(&self) -> usize {
        self.free_calls.load(Ordering::SeqCst)
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.lock().unwrap().len()
    }

    fn allocate(&self, output_binary_size: *mut c_int, output_wav: *mut *mut u8) {
        let buffer = self.wav_bytes.clone().into_boxed_slice();
        let len = buffer.len();
        let ptr = Box::into_raw(buffer) as *mut u8;
        self.live_buffers.lock().unwrap().push((ptr as usize, len));
        unsafe {
            *output_binary_size = len as c_int;
            *output_wav = ptr;
        }
    }
}

impl Default for StubCore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StubCore {
    fn drop(&mut self) {
        let leftover = std::mem::take(&mut *self.live_buffers.lock().unwrap());
        for (ptr, len) in leftover {
            drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr as *mut u8, len)) });
        }
    }
}

impl CoreApi for StubCore {
    unsafe fn initialize(
        &self,
        _root_dir_path: *const c_char,
        _use_gpu: bool,
        _cpu_num_threads: c_int,
    ) -> bool {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        self.init_result
    }

    unsafe fn finalize(&self) {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
    }

    unsafe fn metas(&self) -> *const c_char {
        self.metas_json.lock().unwrap().as_ptr()
    }

    unsafe fn supported_devices(&self) -> *const c_char {
        self.devices_json.lock().unwrap().as_ptr()
    }

    unsafe fn yukarin_s_forward(
        &self,
        length: i64,
        phoneme_list: *const i64,
        _speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        if !self.forward_result {
            return false;
        }
        for i in 0..length as usize {
            *output.add(i) = (*phoneme_list.add(i)) as f32 * 0.01 + 0.05;
        }
        true
    }

    unsafe fn yukarin_sa_forward(
        &self,
        length: i64,
        vowel_phoneme_list: *const i64,
        _consonant_phoneme_list: *const i64,
        _start_accent_list: *const i64,
        _end_accent_list: *const i64,
        _start_accent_phrase_list: *const i64,
        _end_accent_phrase_list: *const i64,
        _speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        if !self.forward_result {
            return false;
        }
        for i in 0..length as usize {
            *output.add(i) = (*vowel_phoneme_list.add(i)) as f32 * 0.1 + 5.0;
        }
        true
    }

    unsafe fn decode_forward(
        &self,
        length: i64,
        _phoneme_size: i64,
        f0: *const f32,
        _phoneme: *const f32,
        _speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        if !self.forward_result {
            return false;
        }
        // 256 samples per frame, amplitude keyed off the frame pitch
        for frame in 0..length as usize {
            let pitch = *f0.add(frame);
            for sample in 0..256 {
                *output.add(frame * 256 + sample) = pitch * 0.001;
            }
        }
        true
    }

    unsafe fn last_error_message(&self) -> *const c_char {
        self.last_error.lock().unwrap().as_ptr()
    }

    unsafe fn initialize_openjtalk(&self, _dict_path: *const c_char) -> c_int {
        self.openjtalk_calls.fetch_add(1, Ordering::SeqCst);
        self.openjtalk_result
    }

    unsafe fn tts(
        &self,
        _text: *const c_char,
        speaker_id: i64,
        output_binary_size: *mut c_int,
        output_wav: *mut *mut u8,
    ) -> c_int {
        self.tts_calls.fetch_add(1, Ordering::SeqCst);
        if !self.known_speakers.contains(&speaker_id) {
            return UNKNOWN_SPEAKER_CODE;
        }
        if self.tts_result == 0 || self.fail_allocates_buffer {
            self.allocate(output_binary_size, output_wav);
        }
        self.tts_result
    }

    unsafe fn wav_free(&self, wav: *mut u8) {
        assert!(!wav.is_null(), "stub: freed a null audio buffer");
        let mut live = self.live_buffers.lock().unwrap();
        let index = live
            .iter()
            .position(|&(ptr, _)| ptr == wav as usize)
            .expect("stub: freed an unknown or already-freed audio buffer");
        let (ptr, len) = live.swap_remove(index);
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            ptr as *mut u8,
            len,
        )));
        self.free_calls.fetch_add(1, Ordering::SeqCst);
    }

    unsafe fn error_result_to_message(&self, result_code: c_int) -> *const c_char {
        self.code_messages
            .iter()
            .find(|&&(code, _)| code == result_code)
            .map(|(_, message)| message.as_ptr())
            .unwrap_or_else(|| self.unknown_code_message.as_ptr())
    }
}

// The engine owns its core as a boxed trait object; tests keep a second
// handle to the same stub through an Arc to read the counters afterwards.
impl CoreApi for Arc<StubCore> {
    unsafe fn initialize(
        &self,
        root_dir_path: *const c_char,
        use_gpu: bool,
        cpu_num_threads: c_int,
    ) -> bool {
        (**self).initialize(root_dir_path, use_gpu, cpu_num_threads)
    }

    unsafe fn finalize(&self) {
        (**self).finalize()
    }

    unsafe fn metas(&self) -> *const c_char {
        (**self).metas()
    }

    unsafe fn supported_devices(&self) -> *const c_char {
        (**self).supported_devices()
    }

    unsafe fn yukarin_s_forward(
        &self,
        length: i64,
        phoneme_list: *const i64,
        speaker_id: *const i64,
        output: *mut f32,
    ) -> bool {
        (**self).yukarin_s_forward(length, phoneme_list, speaker_id, output)
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
        (**self).yukarin_sa_forward(
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
        (**self).decode_forward(length, phoneme_size, f0, phoneme, speaker_id, output)
    }

    unsafe fn last_error_message(&self) -> *const c_char {
        (**self).last_error_message()
    }

    unsafe fn initialize_openjtalk(&self, dict_path: *const c_char) -> c_int {
        (**self).initialize_openjtalk(dict_path)
    }

    unsafe fn tts(
        &self,
        text: *const c_char,
        speaker_id: i64,
        output_binary_size: *mut c_int,
        output_wav: *mut *mut u8,
    ) -> c_int {
        (**self).tts(text, speaker_id, output_binary_size, output_wav)
    }

    unsafe fn wav_free(&self, wav: *mut u8) {
        (**self).wav_free(wav)
    }

    unsafe fn error_result_to_message(&self, result_code: c_int) -> *const c_char {
        (**self).error_result_to_message(result_code)
    }
}
