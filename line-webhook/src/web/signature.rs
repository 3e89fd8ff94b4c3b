//! LINE webhook signature verification.
//!
//! LINE signs every webhook request body with HMAC-SHA256 keyed by the
//! channel secret and sends the base64 digest in the `X-Line-Signature`
//! header.
//! Reference: https://developers.line.biz/en/reference/messaging-api/#signature-validation

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Compute the base64 HMAC-SHA256 signature of `body` keyed by `secret`.
pub fn compute_signature(body: &[u8], secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(B64.encode(mac.finalize().into_bytes()))
}

/// Verify a LINE webhook signature.
///
/// # Arguments
///
/// * `body` - The raw, unmodified request body
/// * `secret` - The channel secret
/// * `provided_signature` - The `X-Line-Signature` header value
///
/// # Returns
///
/// `true` only if the trimmed signature equals the expected digest. An
/// empty signature is a plain mismatch, never an error.
pub fn verify_signature(body: &[u8], secret: &[u8], provided_signature: &str) -> bool {
    let provided = provided_signature.trim();
    if provided.is_empty() {
        return false;
    }

    let expected = match compute_signature(body, secret) {
        Some(sig) => sig,
        None => {
            warn!("line_signature_invalid_key");
            return false;
        }
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(expected.as_bytes(), provided.as_bytes());

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            "line_signature_mismatch"
        );
    }

    valid
}

/// Constant-time byte comparison.
///
/// The length check leaks only the length, which is fixed for a SHA-256
/// digest and therefore public.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Extract the signature header. Header name lookup is case-insensitive.
pub fn signature_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Instant;

    const SECRET: &[u8] = b"test-channel-secret";

    fn sign(body: &[u8]) -> String {
        compute_signature(body, SECRET).unwrap()
    }

    #[test]
    fn test_verify_signature_valid() {
        let bodies: [&[u8]; 4] = [
            b"",
            b"{}",
            br#"{"destination":"U1","events":[]}"#,
            &[0u8, 159, 146, 150, 255],
        ];

        for body in bodies {
            let signature = sign(body);
            assert!(verify_signature(body, SECRET, &signature));
        }
    }

    #[test]
    fn test_verify_signature_trims_whitespace() {
        let body = br#"{"events":[]}"#;
        let signature = format!("  {}\t\n", sign(body));
        assert!(verify_signature(body, SECRET, &signature));
    }

    #[test]
    fn test_verify_signature_empty_and_blank() {
        assert!(!verify_signature(b"{}", SECRET, ""));
        assert!(!verify_signature(b"{}", SECRET, "   "));
    }

    #[test]
    fn test_verify_signature_wrong_secret_or_body() {
        let signature = sign(b"{}");
        assert!(!verify_signature(b"{}", b"other-secret", &signature));
        assert!(!verify_signature(b"{ }", SECRET, &signature));
    }

    #[test]
    fn test_verify_signature_single_bit_mutation() {
        let body = br#"{"events":[{"type":"follow"}]}"#;
        let signature = sign(body);

        for index in 0..signature.len() {
            for bit in 0..8 {
                let mut mutated = signature.clone().into_bytes();
                mutated[index] ^= 1 << bit;
                let Ok(mutated) = String::from_utf8(mutated) else {
                    continue;
                };
                assert!(
                    !verify_signature(body, SECRET, &mutated),
                    "mutation at byte {index} bit {bit} accepted"
                );
            }
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }

    #[test]
    fn test_compare_time_independent_of_mismatch_position() {
        let expected = sign(b"timing").into_bytes();
        let mut first = expected.clone();
        first[0] ^= 0x01;
        let mut last = expected.clone();
        let n = last.len() - 1;
        last[n] ^= 0x01;

        const TRIALS: u32 = 50_000;

        let measure = |candidate: &[u8]| {
            let start = Instant::now();
            for _ in 0..TRIALS {
                std::hint::black_box(constant_time_compare(
                    std::hint::black_box(&expected),
                    std::hint::black_box(candidate),
                ));
            }
            start.elapsed().as_secs_f64()
        };

        // Warm up, then take the best of several runs to damp scheduler noise.
        measure(&first);
        let best = |candidate: &[u8]| (0..5).map(|_| measure(candidate)).fold(f64::MAX, f64::min);
        let t_first = best(&first);
        let t_last = best(&last);

        let ratio = t_first.max(t_last) / t_first.min(t_last);
        assert!(ratio < 3.0, "timing ratio {ratio} (first={t_first}, last={t_last})");
    }

    #[test]
    fn test_signature_from_headers_case_insensitive() {
        let mut headers = HeaderMap::new();
        assert_eq!(signature_from_headers(&headers), None);

        headers.insert("X-Line-Signature", HeaderValue::from_static("abc="));
        assert_eq!(signature_from_headers(&headers), Some("abc="));
    }
}
