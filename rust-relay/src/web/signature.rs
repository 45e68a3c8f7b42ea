//! GitHub webhook signature verification.
//!
//! GitHub signs every delivery with HMAC-SHA256 over the raw request body,
//! keyed by the webhook secret, and sends it as `X-Hub-Signature-256:
//! sha256=<hex digest>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Why a webhook failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature missing")]
    Missing,
    #[error("unsupported hash type")]
    UnsupportedHashType,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a GitHub webhook signature.
///
/// A header that is present but not valid UTF-8 is judged on its bytes and
/// never reported as missing.
///
/// # Arguments
///
/// * `secret` - The webhook secret configured on GitHub
/// * `header` - Raw value of the `X-Hub-Signature-256` header, if present
/// * `body` - The exact raw request body
pub fn verify_github_signature(
    secret: &str,
    header: Option<&[u8]>,
    body: &[u8],
) -> Result<(), SignatureError> {
    let header = match header {
        Some(h) => h,
        None => {
            warn!("github_signature_missing");
            return Err(SignatureError::Missing);
        }
    };

    let separator = header.iter().position(|&b| b == b'=');
    let signature = match separator {
        Some(idx) if &header[..idx] == b"sha256" => &header[idx + 1..],
        _ => {
            let scheme = &header[..separator.unwrap_or(header.len())];
            warn!(
                scheme = %String::from_utf8_lossy(scheme),
                "github_signature_unsupported_hash_type"
            );
            return Err(SignatureError::UnsupportedHashType);
        }
    };

    let expected_signature = match sign(secret, body) {
        Ok(s) => s,
        Err(_) => {
            warn!("github_signature_invalid_key");
            return Err(SignatureError::Mismatch);
        }
    };

    if !constant_time_compare(expected_signature.as_bytes(), signature) {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "github_signature_mismatch"
        );
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Compute the lowercase hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
