//! Speaker metadata and device availability types.
//!
//! The core owns the JSON schema; these types mirror its published shape.
//! Both reports are re-fetched from the core on every call, never cached, so
//! they always reflect current native-side state.

use serde::{Deserialize, Serialize};

use super::core::VoicevoxError;

/// One speaker as reported by the core's `metas` export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerMeta {
    /// Display name of the speaker.
    pub name: String,
    /// Stable identifier for the speaker across core versions.
    pub speaker_uuid: String,
    /// Voice styles offered by this speaker. Style ids are what synthesis
    /// calls accept as `speaker_id`.
    pub styles: Vec<SpeakerStyle>,
    /// Core version the speaker data was built for.
    pub version: String,
}

impl SpeakerMeta {
    /// Ids of all styles of this speaker, in listed order.
    pub fn style_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.styles.iter().map(|style| style.id)
    }
}

/// A single voice style of a speaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerStyle {
    /// Display name of the style (e.g. "ノーマル").
    pub name: String,
    /// Id accepted by synthesis calls.
    pub id: i64,
}

/// Device availability as reported by the core's `supported_devices` export.
///
/// `cpu` and `cuda` are required keys; `dml` is absent from older cores and
/// defaults to false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedDevices {
    pub cpu: bool,
    pub cuda: bool,
    #[serde(default)]
    pub dml: bool,
}

impl SupportedDevices {
    /// True if any GPU execution path is available.
    pub fn gpu_available(&self) -> bool {
        self.cuda || self.dml
    }
}

/// Parse the `metas` JSON byte string into speaker descriptors.
pub(crate) fn parse_speakers(json: &str) -> Result<Vec<SpeakerMeta>, VoicevoxError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse the `supported_devices` JSON byte string.
pub(crate) fn parse_devices(json: &str) -> Result<SupportedDevices, VoicevoxError> {
    Ok(serde_json::from_str(json)?)
}
