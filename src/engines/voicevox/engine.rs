use std::ffi::CString;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::{SynthesisEngine, SynthesisResult};

use super::core::{decode_cstr, CoreApi, VoicevoxError, WavBuffer};
use super::fault;
use super::library::DynCore;
use super::metas::{self, SpeakerMeta, SupportedDevices};

/// Parameters for configuring how the core library is loaded and
/// initialized.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct VoicevoxModelParams {
    /// Initialize for GPU inference. Default false (CPU).
    pub use_gpu: bool,
    /// Number of CPU threads for inference. 0 picks a core-count-based
    /// default inside the native library.
    pub cpu_num_threads: i32,
    /// Open JTalk dictionary directory. When absent, the text-analysis
    /// subsystem is not initialized and full TTS will fail inside the core.
    pub dict_dir: Option<PathBuf>,
    /// Working directory passed to core initialization. Defaults to the
    /// directory containing the core library.
    pub init_dir: Option<PathBuf>,
    /// Runtime library (e.g. ONNX Runtime) to preload before the core, for
    /// core builds that locate it through the loader.
    pub runtime_path: Option<PathBuf>,
    /// Install the process-wide fault handler before the first native call.
    /// The core can fault the process on contract violations; the handler
    /// makes that diagnosable, it does not prevent it.
    #[builder(default = "true")]
    pub enable_fault_handler: bool,
}

impl Default for VoicevoxModelParams {
    fn default() -> Self {
        Self {
            use_gpu: false,
            cpu_num_threads: 0,
            dict_dir: None,
            init_dir: None,
            runtime_path: None,
            enable_fault_handler: true,
        }
    }
}

/// Parameters for configuring a VOICEVOX synthesis request.
#[derive(Debug, Clone)]
pub struct VoicevoxInferenceParams {
    /// Style id to synthesize with, as listed by
    /// [`VoicevoxEngine::metas`].
    pub speaker_id: i64,
}

impl Default for VoicevoxInferenceParams {
    fn default() -> Self {
        Self { speaker_id: 0 }
    }
}

/// VOICEVOX text-to-speech engine.
///
/// Wraps the VOICEVOX CORE shared library behind a safe lifecycle: loading
/// resolves and validates all paths, loads the library, runs core
/// initialization, and optionally initializes the Open JTalk text-analysis
/// subsystem. Loading is all-or-nothing, so an engine in the loaded state is
/// always fully usable. Synthesis and metadata calls are synchronous,
/// blocking calls into the core; thread safety is whatever the core
/// provides, which is undocumented, so keep one engine per thread.
pub struct VoicevoxEngine {
    core: Option<Box<dyn CoreApi>>,
    library_path: Option<PathBuf>,
}

impl std::fmt::Debug for VoicevoxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicevoxEngine")
            .field("loaded", &self.core.is_some())
            .field("library_path", &self.library_path)
            .finish()
    }
}

impl Default for VoicevoxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicevoxEngine {
    /// Create a new engine with no core loaded.
    pub fn new() -> Self {
        Self {
            core: None,
            library_path: None,
        }
    }

    /// True if a core library is loaded and initialized.
    pub fn is_loaded(&self) -> bool {
        self.core.is_some()
    }

    /// Path of the loaded core library, if any.
    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    /// Speakers and styles currently offered by the core. Re-fetched from
    /// the core on every call.
    pub fn metas(&self) -> Result<Vec<SpeakerMeta>, VoicevoxError> {
        let core = self.core()?;
        let json = unsafe { decode_cstr(core.metas(), "metas") }?;
        metas::parse_speakers(&json)
    }

    /// Device availability as reported by the core. Re-fetched on every
    /// call.
    pub fn supported_devices(&self) -> Result<SupportedDevices, VoicevoxError> {
        let core = self.core()?;
        let json = unsafe { decode_cstr(core.supported_devices(), "supported_devices") }?;
        metas::parse_devices(&json)
    }

    /// Synthesize `text` with the given style id and return the WAV bytes.
    ///
    /// The returned vector holds exactly the byte count the core reported.
    /// The core-allocated buffer is copied out and released before this
    /// returns, on the failure path as well.
    pub fn tts(&self, text: &str, speaker_id: i64) -> Result<Vec<u8>, VoicevoxError> {
        let core = self.core()?;
        let text = CString::new(text)?;
        let mut output_binary_size: c_int = 0;
        let mut output_wav: *mut u8 = std::ptr::null_mut();

        let code = unsafe {
            core.tts(
                text.as_ptr(),
                speaker_id,
                &mut output_binary_size,
                &mut output_wav,
            )
        };
        let buffer =
            unsafe { WavBuffer::from_raw(core, output_wav, output_binary_size.max(0) as usize) };

        if code != 0 {
            drop(buffer);
            return Err(VoicevoxError::Synthesis(describe_code(core, code)));
        }

        log::debug!("Synthesized {} bytes", buffer.len());
        Ok(buffer.take())
    }

    fn core(&self) -> Result<&dyn CoreApi, VoicevoxError> {
        self.core.as_deref().ok_or(VoicevoxError::NotLoaded)
    }

    fn load_impl(
        &mut self,
        library_path: &Path,
        params: VoicevoxModelParams,
    ) -> Result<(), VoicevoxError> {
        let library_path = library_path.canonicalize()?;
        let runtime_path = match &params.runtime_path {
            Some(path) => Some(path.canonicalize()?),
            None => None,
        };
        let dict_dir = match &params.dict_dir {
            Some(path) => Some(path.canonicalize()?),
            None => None,
        };
        let init_dir = match &params.init_dir {
            Some(dir) => dir.canonicalize()?,
            None => library_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };

        if params.enable_fault_handler {
            fault::enable();
        }

        let core = DynCore::load(&library_path, runtime_path.as_deref())?;
        self.attach(Box::new(core), &init_dir, dict_dir.as_deref(), &params)?;
        self.library_path = Some(library_path);
        Ok(())
    }

    /// Run core initialization (and optional Open JTalk initialization)
    /// against an already-loaded interface. The engine takes ownership of
    /// the core only after every step succeeds.
    fn attach(
        &mut self,
        core: Box<dyn CoreApi>,
        init_dir: &Path,
        dict_dir: Option<&Path>,
        params: &VoicevoxModelParams,
    ) -> Result<(), VoicevoxError> {
        let init_dir = path_to_cstring(init_dir)?;
        let initialized =
            unsafe { core.initialize(init_dir.as_ptr(), params.use_gpu, params.cpu_num_threads) };
        if !initialized {
            return Err(VoicevoxError::Initialize(last_error(core.as_ref())));
        }

        if let Some(dict_dir) = dict_dir {
            let dict_dir = path_to_cstring(dict_dir)?;
            let code = unsafe { core.initialize_openjtalk(dict_dir.as_ptr()) };
            if code != 0 {
                return Err(VoicevoxError::OpenJtalk(describe_code(core.as_ref(), code)));
            }
        }

        log::info!(
            "VOICEVOX CORE initialized (gpu: {}, threads: {})",
            params.use_gpu,
            params.cpu_num_threads
        );
        self.core = Some(core);
        Ok(())
    }
}

impl Drop for VoicevoxEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for VoicevoxEngine {
    type SynthesisParams = VoicevoxInferenceParams;
    type ModelParams = VoicevoxModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.load_impl(model_path, params)?;
        Ok(())
    }

    fn unload_model(&mut self) {
        if let Some(core) = self.core.take() {
            unsafe { core.finalize() };
            self.library_path = None;
            log::info!("VOICEVOX CORE finalized");
        }
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let params = params.unwrap_or_default();
        let wav = self.tts(text, params.speaker_id)?;
        Ok(SynthesisResult { wav })
    }
}

/// Decode a result code through the core's own message table.
fn describe_code(core: &dyn CoreApi, code: c_int) -> String {
    unsafe {
        decode_cstr(
            core.error_result_to_message(code),
            "voicevox_error_result_to_message",
        )
    }
    .unwrap_or_else(|_| format!("result code {code}"))
}

/// Fetch the core's message for the most recent boolean-flag failure.
fn last_error(core: &dyn CoreApi) -> String {
    unsafe { decode_cstr(core.last_error_message(), "last_error_message") }
        .unwrap_or_else(|_| "unknown error".to_string())
}

fn path_to_cstring(path: &Path) -> Result<CString, VoicevoxError> {
    Ok(CString::new(path.to_string_lossy().into_owned())?)
}
