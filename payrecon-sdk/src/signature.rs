//! Request signing for the payment provider API.
//!
//! Every provider request carries three headers:
//!
//! ```text
//! Access-Id:        {access_id}
//! Access-Time:      {unix_timestamp}
//! Access-Signature: {base64_signature}
//! ```
//!
//! The signature is computed as
//! `HMAC-SHA256("{access_id}:{access_time}:{body}", access_key)`.

/// Header carrying the project access id.
pub const ACCESS_ID_HEADER: &str = "Access-Id";

/// Header carrying the signing timestamp.
pub const ACCESS_TIME_HEADER: &str = "Access-Time";

/// Header carrying the base64 request signature.
pub const ACCESS_SIGNATURE_HEADER: &str = "Access-Signature";

/// Header for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Payrecon-Admin-Authorization";

/// The three header values attached to a signed provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessHeaders {
    pub access_id: String,
    pub access_time: i64,
    pub signature: String,
}

fn signing_payload(access_id: &str, access_time: i64, body: &str) -> String {
    format!("{access_id}:{access_time}:{body}")
}

/// Sign a request body at an explicit timestamp.
pub fn sign_request_at(access_id: &str, access_time: i64, body: &str, key: &[u8]) -> AccessHeaders {
    let data = signing_payload(access_id, access_time, body);
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    AccessHeaders {
        access_id: access_id.to_owned(),
        access_time,
        signature: fast32::base64::RFC4648_NOPAD.encode(sig.as_ref()),
    }
}

/// Sign a request body with the current time.
pub fn sign_request(access_id: &str, body: &str, key: &[u8]) -> AccessHeaders {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    sign_request_at(access_id, now, body, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"provider-access-key";

    #[test]
    fn test_signature_matches_known_vector() {
        let headers = sign_request_at("project/123", 1_700_000_000, r#"{"transfers":[]}"#, KEY);
        assert_eq!(headers.access_id, "project/123");
        assert_eq!(headers.access_time, 1_700_000_000);
        assert_eq!(headers.signature, "9DA3CFnZff+s4UFQJ2kn1YE4WJpf4sCv8NChAq6cyaM");
    }

    #[test]
    fn test_signature_covers_body_and_time() {
        let base = sign_request_at("p", 1_700_000_000, r#"{"amount":950}"#, KEY);
        let other_body = sign_request_at("p", 1_700_000_000, r#"{"amount":9500}"#, KEY);
        let other_time = sign_request_at("p", 1_700_000_001, r#"{"amount":950}"#, KEY);
        let other_key = sign_request_at("p", 1_700_000_000, r#"{"amount":950}"#, b"other-key");
        assert_ne!(base.signature, other_body.signature);
        assert_ne!(base.signature, other_time.signature);
        assert_ne!(base.signature, other_key.signature);
    }

    #[test]
    fn test_sign_request_uses_current_time() {
        let before = time::OffsetDateTime::now_utc().unix_timestamp();
        let headers = sign_request("p", "{}", KEY);
        let after = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!((before..=after).contains(&headers.access_time));
        assert_eq!(headers, sign_request_at("p", headers.access_time, "{}", KEY));
    }
}
