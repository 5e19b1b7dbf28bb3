//! Webhook signature verification.
//!
//! Two schemes are supported, matching what telephony providers actually
//! ship:
//!
//! - **HMAC** (shared secret): the provider signs a canonical string built
//!   from the request URL followed by all form parameters sorted by key
//!   (each key immediately followed by its value). Non-form bodies are
//!   signed as URL + raw body. HMAC-SHA256, base64 signature header.
//! - **Ed25519** (public key): the provider signs `"{timestamp}|{raw_body}"`
//!   with its private key; we verify the detached signature with the
//!   published public key after rejecting stale timestamps.
//!
//! Verification never errors: any missing input, malformed key material, or
//! cryptographic failure yields `false`. No configured credential means
//! nothing can be verified, so every request is rejected (fail closed).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signature, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Replay tolerance applied to the Ed25519 scheme's timestamp.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Credential material for one of the two supported schemes.
#[derive(Debug, Clone)]
pub enum SignatureScheme {
    /// Shared secret for the HMAC canonical-string scheme
    HmacSecret(String),
    /// Base64-encoded 32-byte Ed25519 public key
    Ed25519PublicKey(String),
}

/// Stateless verifier configured once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    scheme: Option<SignatureScheme>,
    tolerance: Duration,
}

impl SignatureVerifier {
    pub fn new(scheme: Option<SignatureScheme>, tolerance: Duration) -> Self {
        Self { scheme, tolerance }
    }

    /// Verifies a webhook request. Returns `false` on any failure; never
    /// panics or allocates beyond the canonical string.
    pub fn verify(
        &self,
        url: &str,
        raw_body: &[u8],
        signature_header: Option<&str>,
        timestamp_header: Option<&str>,
    ) -> bool {
        let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs(),
            Err(_) => return false,
        };
        self.verify_at(now, url, raw_body, signature_header, timestamp_header)
    }

    /// Clock-injected variant used by `verify` and the replay-window tests.
    pub fn verify_at(
        &self,
        now_unix: u64,
        url: &str,
        raw_body: &[u8],
        signature_header: Option<&str>,
        timestamp_header: Option<&str>,
    ) -> bool {
        let Some(signature) = signature_header.map(str::trim).filter(|s| !s.is_empty()) else {
            return false;
        };

        match &self.scheme {
            None => false,
            Some(SignatureScheme::HmacSecret(secret)) => {
                verify_hmac(secret, url, raw_body, signature)
            }
            Some(SignatureScheme::Ed25519PublicKey(public_key)) => {
                let Some(timestamp) = timestamp_header.map(str::trim).filter(|s| !s.is_empty())
                else {
                    return false;
                };
                if !timestamp_fresh(timestamp, now_unix, self.tolerance) {
                    return false;
                }
                verify_ed25519(public_key, timestamp, raw_body, signature)
            }
        }
    }
}

/// Builds the canonical signing string for the HMAC scheme: the request URL
/// followed by all form parameters sorted by key, each key immediately
/// followed by its value. Bodies that do not parse as form data are appended
/// raw so that any byte tampering still breaks the signature.
pub fn hmac_canonical(url: &str, raw_body: &[u8]) -> Vec<u8> {
    let mut canonical = url.as_bytes().to_vec();

    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw_body) {
        Ok(mut pairs) if !raw_body.is_empty() => {
            pairs.sort();
            for (key, value) in &pairs {
                canonical.extend_from_slice(key.as_bytes());
                canonical.extend_from_slice(value.as_bytes());
            }
        }
        _ => canonical.extend_from_slice(raw_body),
    }

    canonical
}

fn verify_hmac(secret: &str, url: &str, raw_body: &[u8], signature: &str) -> bool {
    let Ok(provided) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(&hmac_canonical(url, raw_body));
    let expected = mac.finalize().into_bytes();

    expected.ct_eq(provided.as_slice()).into()
}

fn timestamp_fresh(timestamp: &str, now_unix: u64, tolerance: Duration) -> bool {
    let Ok(ts) = timestamp.parse::<u64>() else {
        return false;
    };
    // Stale beyond the window defeats the signature even if it is valid;
    // a small amount of forward clock skew is tolerated symmetrically.
    now_unix.abs_diff(ts) <= tolerance.as_secs()
}

fn verify_ed25519(public_key_b64: &str, timestamp: &str, raw_body: &[u8], signature: &str) -> bool {
    let Ok(key_bytes) = BASE64.decode(public_key_b64) else {
        return false;
    };
    let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_array) else {
        return false;
    };

    let Ok(sig_bytes) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_array);

    let mut message = Vec::with_capacity(timestamp.len() + 1 + raw_body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'|');
    message.extend_from_slice(raw_body);

    verifying_key.verify_strict(&message, &signature).is_ok()
}
