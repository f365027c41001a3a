use super::oauth_client::GraphAuth;
use crate::api::{GraphError, GraphResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The only signing algorithm the platform uses.
const SIGNED_REQUEST_ALGORITHM: &str = "HMAC-SHA256";

#[derive(Deserialize)]
struct SignedRequestHeader {
    algorithm: String,
}

impl GraphAuth {
    /// Verifies and decodes a signed request with this app's secret.
    pub fn parse_signed_request(&self, signed_request: &str) -> GraphResult<Value> {
        parse_signed_request(signed_request, &self.app_secret)
    }
}

/// Verifies and decodes a `<signature>.<payload>` signed request.
///
/// Both halves are base64url-encoded. The payload is JSON, and the signature
/// is an HMAC-SHA256 of the encoded payload keyed by the app secret.
pub fn parse_signed_request(signed_request: &str, app_secret: &str) -> GraphResult<Value> {
    // There are two components to a signed request: its signature, and its payload.
    // Unlike a JWT, there's no header; the algorithm lives within the payload.
    let Some((encoded_signature, encoded_payload)) = signed_request.split_once('.') else {
        return Err(GraphError::InvalidSignedRequest("missing separator"));
    };

    let signature = decode_segment(encoded_signature)?;
    let payload = decode_segment(encoded_payload)?;

    // We'll need the payload parsed before verifying, as it tells us which algorithm was used.
    let document: Value = serde_json::from_slice(&payload)
        .map_err(|_| GraphError::InvalidSignedRequest("payload is not valid JSON"))?;
    let header = SignedRequestHeader::deserialize(&document)
        .map_err(|_| GraphError::InvalidSignedRequest("payload has no algorithm"))?;
    if !header.algorithm.eq_ignore_ascii_case(SIGNED_REQUEST_ALGORITHM) {
        return Err(GraphError::InvalidSignedRequest("unsupported algorithm"));
    }

    // Let's ensure the signature matches. It's computed over the still-encoded
    // payload, not the decoded JSON.
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| GraphError::InvalidSignedRequest("unusable app secret"))?;
    mac.update(encoded_payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| GraphError::InvalidSignedRequest("signature mismatch"))?;

    Ok(document)
}

/// Decodes a URL-safe base64 segment, whether or not it was padded.
fn decode_segment(segment: &str) -> GraphResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| GraphError::InvalidSignedRequest("segment is not valid base64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "58bd3e9660cf9487";

    fn sign(payload: &Value, secret: &str) -> String {
        let encoded_payload = URL_SAFE_NO_PAD.encode(payload.to_string());
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(encoded_payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{signature}.{encoded_payload}")
    }

    #[test]
    fn test_valid_signed_request() {
        let payload = json!({"algorithm": "HMAC-SHA256", "user_id": "42", "issued_at": 1700000000});
        let decoded = parse_signed_request(&sign(&payload, SECRET), SECRET).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_padded_segments_are_accepted() {
        let payload = json!({"algorithm": "HMAC-SHA256", "user_id": "7"});
        let signed = sign(&payload, SECRET);
        let (signature, body) = signed.split_once('.').unwrap();
        let padded = format!("{signature}=.{body}");
        assert_eq!(parse_signed_request(&padded, SECRET).unwrap(), payload);
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let payload = json!({"algorithm": "HMAC-SHA256", "user_id": "42"});
        let signed = sign(&payload, "another secret");
        let err = parse_signed_request(&signed, SECRET).unwrap_err();
        assert!(matches!(err, GraphError::InvalidSignedRequest("signature mismatch")));
    }

    #[test]
    fn test_wrong_algorithm_is_rejected() {
        let payload = json!({"algorithm": "HMAC-SHA1"});
        let err = parse_signed_request(&sign(&payload, SECRET), SECRET).unwrap_err();
        assert!(matches!(err, GraphError::InvalidSignedRequest("unsupported algorithm")));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            parse_signed_request("no-separator", SECRET),
            Err(GraphError::InvalidSignedRequest("missing separator"))
        ));
        assert!(matches!(
            parse_signed_request("!!!.???", SECRET),
            Err(GraphError::InvalidSignedRequest("segment is not valid base64"))
        ));
    }

    #[test]
    fn test_through_graph_auth() {
        let auth = GraphAuth::new("1234", SECRET).unwrap();
        let payload = json!({"algorithm": "HMAC-SHA256", "code": "abc"});
        assert_eq!(auth.parse_signed_request(&sign(&payload, SECRET)).unwrap(), payload);
    }
}
