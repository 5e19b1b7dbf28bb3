//! Speech-synthesis contracts: one request per utterance, with the
//! utterance ID doubling as the barge-in cancellation handle.

use serde::{Deserialize, Serialize};

use crate::errors::FieldError;

/// Audio encodings the synthesis endpoint accepts.
pub const AUDIO_FORMATS: [&str; 4] = ["pcm", "linear16", "ulaw", "mp3"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    #[serde(default)]
    pub trace_id: Option<String>,
    pub tenant_id: String,
    pub call_id: String,
    /// Cancellation handle for this utterance
    pub utterance_id: String,
    /// Requested provider, e.g. "elevenlabs"; unsupported values degrade to
    /// the placeholder fallback rather than erroring
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub voice: VoiceParams,
    pub audio: AudioParams,
    pub text: String,
}

fn default_provider() -> String {
    "elevenlabs".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceParams {
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub stability: Option<f32>,
    #[serde(default)]
    pub similarity_boost: Option<f32>,
    #[serde(default)]
    pub style: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioParams {
    /// "pcm" | "linear16" | "ulaw" | "mp3"
    pub format: String,
    pub sample_rate_hz: u32,
}

impl SynthesisRequest {
    /// Field-level schema validation; an empty result means the request is
    /// acceptable for synthesis.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.tenant_id.trim().is_empty() {
            errors.push(FieldError::new("tenant_id", "must not be empty"));
        }
        if self.call_id.trim().is_empty() {
            errors.push(FieldError::new("call_id", "must not be empty"));
        }
        if self.utterance_id.trim().is_empty() {
            errors.push(FieldError::new("utterance_id", "must not be empty"));
        }
        if self.text.trim().is_empty() {
            errors.push(FieldError::new("text", "must not be empty"));
        }
        if !AUDIO_FORMATS.contains(&self.audio.format.as_str()) {
            errors.push(FieldError::new(
                "audio.format",
                format!("must be one of: {}", AUDIO_FORMATS.join(", ")),
            ));
        }
        if self.audio.sample_rate_hz == 0 {
            errors.push(FieldError::new("audio.sample_rate_hz", "must be positive"));
        }
        if let Some(stability) = self.voice.stability {
            if !(0.0..=1.0).contains(&stability) {
                errors.push(FieldError::new(
                    "voice.stability",
                    "must be between 0.0 and 1.0",
                ));
            }
        }
        if let Some(boost) = self.voice.similarity_boost {
            if !(0.0..=1.0).contains(&boost) {
                errors.push(FieldError::new(
                    "voice.similarity_boost",
                    "must be between 0.0 and 1.0",
                ));
            }
        }

        errors
    }
}
