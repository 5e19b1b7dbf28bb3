use super::ServerConfig;

/// Cross-field configuration validation.
///
/// Hard errors are reserved for genuinely ambiguous configuration; missing
/// optional pieces only warn, because every service has a documented
/// degraded mode.
pub fn validate(config: &ServerConfig) -> Result<(), String> {
    if config.webhook_secret.is_some() && config.webhook_public_key.is_some() {
        return Err(
            "Configure at most one of TELEPHONY_WEBHOOK_SECRET and TELEPHONY_WEBHOOK_PUBLIC_KEY"
                .to_string(),
        );
    }

    if config.signature_tolerance_seconds == 0 {
        return Err("SIGNATURE_TOLERANCE_SECONDS must be positive".to_string());
    }

    if config.webhook_secret.is_none() && config.webhook_public_key.is_none() {
        tracing::warn!(
            "no webhook signature material configured; all inbound webhooks will be rejected"
        );
    }
    if config.tenant_routing_path.is_none() {
        tracing::warn!(
            "TENANT_ROUTING_PATH not set; no number resolves to a tenant and all calls will 404"
        );
    }
    if config.completion_api_key.is_none() {
        tracing::info!("no completion credential; turn decisions use the deterministic fallback");
    }
    if config.elevenlabs_api_key.is_none() {
        tracing::info!("no synthesis credential; speech requests serve the placeholder chunk");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_both_schemes_invalid() {
        let config = ServerConfig {
            webhook_secret: Some("s".to_string()),
            webhook_public_key: Some("k".to_string()),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_tolerance_invalid() {
        let config = ServerConfig {
            signature_tolerance_seconds: 0,
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_single_scheme_valid() {
        let config = ServerConfig {
            webhook_secret: Some("s".to_string()),
            ..Default::default()
        };
        assert!(validate(&config).is_ok());
    }
}
