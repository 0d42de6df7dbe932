//! Webhook body signature computation and verification.
//!
//! The sender signs the raw request body with HMAC-SHA256 using the shared
//! secret and puts the lowercase hex digest in `X-Hub-Signature`.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 digest of `payload` keyed by `secret`.
pub fn sign(secret: &[u8], payload: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a claimed webhook signature against the payload.
///
/// The claimed value is compared verbatim against the hex digest, without
/// prefix stripping or case folding.
///
/// # Returns
///
/// `true` only if the claimed signature equals `sign(secret, payload)`.
pub fn verify(secret: &[u8], payload: &[u8], claimed_signature: &str) -> bool {
    let expected_signature = match sign(secret, payload) {
        Ok(sig) => sig,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };

    constant_time_compare(&expected_signature, claimed_signature)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    // ct_eq on slices of unequal length is false without inspecting contents
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
