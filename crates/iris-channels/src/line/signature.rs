//! Webhook signature verification.
//!
//! LINE signs the raw request body with HMAC-SHA256 keyed by the channel
//! secret and sends the base64 digest in the `X-Line-Signature` header.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use iris_core::error::IrisError;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify `signature` against the raw request `body`.
///
/// The digest comparison is constant-time.
pub fn verify(channel_secret: &str, body: &[u8], signature: &str) -> Result<(), IrisError> {
    let expected = BASE64
        .decode(signature)
        .map_err(|_| IrisError::Signature("signature is not valid base64".into()))?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| IrisError::Signature("invalid channel secret".into()))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| IrisError::Signature("signature mismatch".into()))
}

/// Compute the signature for a body. Used to craft signed requests in tests.
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes()).expect("HMAC key length");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}
