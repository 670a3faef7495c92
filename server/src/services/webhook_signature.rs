// server/src/services/webhook_signature.rs

//! HMAC-SHA256 signatures on payment webhook bodies.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Payment-Signature";

fn mac_for(secret: &str, payload: &[u8]) -> HmacSha256 {
  let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
  mac.update(payload);
  mac
}

/// Lower-case hex HMAC-SHA256 of `payload` under `secret`.
pub fn sign(secret: &str, payload: &[u8]) -> String {
  hex::encode(mac_for(secret, payload).finalize().into_bytes())
}

/// Constant-time check of a hex signature. An optional `sha256=` prefix is accepted.
pub fn verify(secret: &str, payload: &[u8], signature: &str) -> bool {
  let signature = signature.trim();
  let hex_part = signature.strip_prefix("sha256=").unwrap_or(signature);
  match hex::decode(hex_part) {
    Ok(expected) => mac_for(secret, payload).verify_slice(&expected).is_ok(),
    Err(_) => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BODY: &[u8] = br#"{"type":"payment_intent.succeeded"}"#;

  #[test]
  fn signature_is_stable_hex() {
    let signature = sign("whsec", BODY);
    assert_eq!(signature.len(), 64);
    assert_eq!(signature, sign("whsec", BODY));
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn verification_accepts_only_the_matching_signature() {
    let signature = sign("whsec", BODY);
    assert!(verify("whsec", BODY, &signature));
    assert!(verify("whsec", BODY, &format!("sha256={}", signature)));
    assert!(!verify("other", BODY, &signature));
    assert!(!verify("whsec", b"{}", &signature));
    assert!(!verify("whsec", BODY, "not-hex"));
    assert!(!verify("whsec", BODY, ""));
  }
}
