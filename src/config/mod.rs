//! Configuration module for the frontdesk server.
//!
//! Configuration is environment-style (with `.env` support via dotenvy).
//! Provider credentials are all optional: a missing completion or synthesis
//! credential degrades the corresponding service to its documented fallback
//! behavior instead of failing startup. Webhook signature material is also
//! optional, but its absence means every inbound webhook is rejected (fail
//! closed), so validation warns loudly about it.

mod env;
mod validation;

use std::path::PathBuf;
use std::time::Duration;

use crate::core::signature::SignatureScheme;

/// Server configuration.
///
/// Contains everything needed to run the frontdesk server:
/// - Server settings (host, port, public base URL for signature canonicalization)
/// - Webhook signature material (HMAC secret or Ed25519 public key)
/// - Tenant routing source path
/// - Completion provider settings (primary decision path)
/// - ElevenLabs settings (primary synthesis path)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// External base URL providers sign against, e.g. `https://edge.example.com`
    pub public_base_url: String,

    // Webhook signature material (at most one scheme)
    pub webhook_secret: Option<String>,
    pub webhook_public_key: Option<String>,
    pub signature_tolerance_seconds: u64,

    // Tenant routing
    pub tenant_routing_path: Option<PathBuf>,

    // Completion provider (turn decisioning)
    pub completion_api_url: String,
    pub completion_api_key: Option<String>,
    pub completion_model: String,
    pub completion_timeout_seconds: u64,

    // Synthesis provider
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_model: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            public_base_url: "http://localhost:3002".to_string(),
            webhook_secret: None,
            webhook_public_key: None,
            signature_tolerance_seconds: 300,
            tenant_routing_path: None,
            completion_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            completion_api_key: None,
            completion_model: "gpt-4o-mini".to_string(),
            completion_timeout_seconds: 10,
            elevenlabs_api_key: None,
            elevenlabs_voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            elevenlabs_model: "eleven_turbo_v2_5".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the server address as host:port
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured webhook signature scheme, if any. `None` means no
    /// webhook can be verified and ingress rejects everything.
    pub fn signature_scheme(&self) -> Option<SignatureScheme> {
        if let Some(secret) = &self.webhook_secret {
            return Some(SignatureScheme::HmacSecret(secret.clone()));
        }
        self.webhook_public_key
            .as_ref()
            .map(|key| SignatureScheme::Ed25519PublicKey(key.clone()))
    }

    pub fn signature_tolerance(&self) -> Duration {
        Duration::from_secs(self.signature_tolerance_seconds)
    }

    /// The canonical URL providers sign for a given request path.
    pub fn signed_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), path)
    }
}
