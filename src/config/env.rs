use std::env;
use std::path::PathBuf;

use super::ServerConfig;
use super::validation::validate;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible
    /// defaults. Also loads from a `.env` file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if a variable is malformed (unparsable port or
    /// timeout) or if both webhook signature schemes are configured at once.
    /// Missing provider credentials are not errors; the services degrade to
    /// their fallback behavior.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = ServerConfig::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .unwrap_or_else(|_| defaults.port.to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        // Webhook signature material
        let webhook_secret = env::var("TELEPHONY_WEBHOOK_SECRET").ok();
        let webhook_public_key = env::var("TELEPHONY_WEBHOOK_PUBLIC_KEY").ok();
        let signature_tolerance_seconds = env::var("SIGNATURE_TOLERANCE_SECONDS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| format!("Invalid SIGNATURE_TOLERANCE_SECONDS: {e}"))?
            .unwrap_or(defaults.signature_tolerance_seconds);

        // Tenant routing source
        let tenant_routing_path = env::var("TENANT_ROUTING_PATH").ok().map(PathBuf::from);

        // Completion provider
        let completion_api_url =
            env::var("COMPLETION_API_URL").unwrap_or(defaults.completion_api_url);
        let completion_api_key = env::var("COMPLETION_API_KEY").ok();
        let completion_model = env::var("COMPLETION_MODEL").unwrap_or(defaults.completion_model);
        let completion_timeout_seconds = env::var("COMPLETION_TIMEOUT_SECONDS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| format!("Invalid COMPLETION_TIMEOUT_SECONDS: {e}"))?
            .unwrap_or(defaults.completion_timeout_seconds);

        // Synthesis provider
        let elevenlabs_api_key = env::var("ELEVENLABS_API_KEY").ok();
        let elevenlabs_voice_id =
            env::var("ELEVENLABS_VOICE_ID").unwrap_or(defaults.elevenlabs_voice_id);
        let elevenlabs_model = env::var("ELEVENLABS_MODEL").unwrap_or(defaults.elevenlabs_model);

        let config = ServerConfig {
            host,
            port,
            public_base_url,
            webhook_secret,
            webhook_public_key,
            signature_tolerance_seconds,
            tenant_routing_path,
            completion_api_url,
            completion_api_key,
            completion_model,
            completion_timeout_seconds,
            elevenlabs_api_key,
            elevenlabs_voice_id,
            elevenlabs_model,
        };

        validate(&config)?;

        Ok(config)
    }
}
