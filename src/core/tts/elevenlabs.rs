//! ElevenLabs request building for the primary synthesis path.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::contracts::SynthesisRequest;

pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Voice settings forwarded to ElevenLabs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: Some(0.5),
            similarity_boost: Some(0.8),
            style: Some(0.0),
        }
    }
}

impl VoiceSettings {
    /// Per-request settings: anything the caller supplied overrides the
    /// defaults field by field.
    pub fn from_request(request: &SynthesisRequest) -> Self {
        let defaults = Self::default();
        Self {
            stability: request.voice.stability.or(defaults.stability),
            similarity_boost: request.voice.similarity_boost.or(defaults.similarity_boost),
            style: request.voice.style.or(defaults.style),
        }
    }
}

/// Maps the requested encoding and sample rate onto an ElevenLabs output
/// format. Narrowband telephony rates get 8 kHz encodings; everything else
/// is wideband PCM at the closest supported rate.
pub fn output_format(format: &str, sample_rate_hz: u32) -> String {
    match format {
        "ulaw" => "ulaw_8000".to_string(),
        "mp3" => match sample_rate_hz {
            0..=22_050 => "mp3_22050_32".to_string(),
            _ => "mp3_44100_128".to_string(),
        },
        // "pcm" | "linear16" and anything the validator let through
        _ => match sample_rate_hz {
            0..=8_000 => "pcm_8000".to_string(),
            8_001..=16_000 => "pcm_16000".to_string(),
            16_001..=22_050 => "pcm_22050".to_string(),
            _ => "pcm_24000".to_string(),
        },
    }
}

/// Content type matching the negotiated output format.
pub fn accept_header(output_format: &str) -> &'static str {
    if output_format.starts_with("mp3") {
        "audio/mpeg"
    } else if output_format.starts_with("ulaw") {
        "audio/basic"
    } else {
        "audio/pcm"
    }
}

/// Builds the streaming synthesis request with ElevenLabs-specific URL,
/// headers, and body.
pub fn build_http_request(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    default_voice_id: &str,
    request: &SynthesisRequest,
) -> reqwest::RequestBuilder {
    let voice_id = request.voice.voice_id.as_deref().unwrap_or(default_voice_id);
    let format = output_format(&request.audio.format, request.audio.sample_rate_hz);
    let url = format!("{ELEVENLABS_TTS_URL}/{voice_id}/stream?output_format={format}");

    let body = json!({
        "text": request.text,
        "model_id": model,
        "voice_settings": VoiceSettings::from_request(request),
    });

    client
        .post(url)
        .header("xi-api-key", api_key)
        .header("Content-Type", "application/json")
        .header("Accept", accept_header(&format))
        .json(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(format: &str, rate: u32) -> SynthesisRequest {
        serde_json::from_value(json!({
            "tenant_id": "tenant_abc",
            "call_id": "c1",
            "utterance_id": "u1",
            "audio": {"format": format, "sample_rate_hz": rate},
            "text": "Hello caller"
        }))
        .unwrap()
    }

    #[test]
    fn test_narrowband_formats() {
        assert_eq!(output_format("ulaw", 8000), "ulaw_8000");
        assert_eq!(output_format("pcm", 8000), "pcm_8000");
    }

    #[test]
    fn test_wideband_formats() {
        assert_eq!(output_format("pcm", 16000), "pcm_16000");
        assert_eq!(output_format("linear16", 22050), "pcm_22050");
        assert_eq!(output_format("pcm", 24000), "pcm_24000");
        assert_eq!(output_format("pcm", 48000), "pcm_24000");
    }

    #[test]
    fn test_mp3_formats() {
        assert_eq!(output_format("mp3", 22050), "mp3_22050_32");
        assert_eq!(output_format("mp3", 44100), "mp3_44100_128");
    }

    #[test]
    fn test_accept_headers() {
        assert_eq!(accept_header("pcm_16000"), "audio/pcm");
        assert_eq!(accept_header("mp3_44100_128"), "audio/mpeg");
        assert_eq!(accept_header("ulaw_8000"), "audio/basic");
    }

    #[test]
    fn test_request_url_and_headers() {
        let client = reqwest::Client::new();
        let req = request("pcm", 16000);
        let built = build_http_request(&client, "test-key", "eleven_turbo_v2_5", "voice-default", &req)
            .build()
            .unwrap();

        let url = built.url().to_string();
        assert!(url.starts_with("https://api.elevenlabs.io/v1/text-to-speech/voice-default/stream"));
        assert!(url.contains("output_format=pcm_16000"));
        assert_eq!(built.headers().get("xi-api-key").unwrap(), "test-key");
        assert_eq!(built.headers().get("accept").unwrap(), "audio/pcm");
    }

    #[test]
    fn test_request_voice_overrides() {
        let client = reqwest::Client::new();
        let mut req = request("pcm", 16000);
        req.voice.voice_id = Some("custom-voice".to_string());
        req.voice.stability = Some(0.9);

        let built = build_http_request(&client, "k", "m", "voice-default", &req)
            .build()
            .unwrap();
        assert!(built.url().path().contains("custom-voice"));

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["voice_settings"]["stability"], 0.9);
        // Unset fields keep their defaults.
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.8);
        assert_eq!(body["model_id"], "m");
    }
}
