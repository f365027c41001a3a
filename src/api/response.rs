use super::error::{ApiError, GraphError, GraphResult};
use super::lookup::{self, is_truthy};
use super::request::ACCESS_TOKEN_KEY;
use bytes::Bytes;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Synthetic error document for bodies we could not interpret.
const UNRECOGNIZED_ENCODING: &str = "Response was not JSON, an image, or a query string";

/// An access token and its optional expiry, taken from a URL-encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFragment {
    pub access_token: String,
    /// The raw expiry value, as sent by the server (seconds).
    pub expires: Option<String>,
}

impl TokenFragment {
    /// The expiry as a duration, if present and numeric.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires
            .as_deref()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// The normalized outcome of a single Graph API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// A parsed JSON document (or a token-less query string, as an object of strings).
    Structured(Value),
    /// An image or other binary payload.
    Binary {
        data: Bytes,
        mime_type: String,
        /// The final URL the payload was served from, after redirects.
        url: String,
    },
    TokenFragment(TokenFragment),
}

impl ApiResponse {
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            ApiResponse::Structured(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<(&Bytes, &str)> {
        match self {
            ApiResponse::Binary {
                data, mime_type, ..
            } => Some((data, mime_type.as_str())),
            _ => None,
        }
    }

    /// The token carried by this response, whether it arrived as a query
    /// string or as a JSON `access_token` field.
    pub fn as_token(&self) -> Option<&str> {
        match self {
            ApiResponse::TokenFragment(fragment) => Some(fragment.access_token.as_str()),
            ApiResponse::Structured(document) => {
                lookup::lookup(document, ACCESS_TOKEN_KEY).and_then(Value::as_str)
            }
            ApiResponse::Binary { .. } => None,
        }
    }

    /// Dotted-path lookup into a structured response.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.as_structured()
            .and_then(|document| lookup::lookup(document, path))
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiResponse::Structured(_) => "structured",
            ApiResponse::Binary { .. } => "binary",
            ApiResponse::TokenFragment(_) => "token",
        }
    }
}

/// Interprets a successful response body by its declared content type.
///
/// JSON wins over images, and images win over the query-string fallback.
/// Structured results are then checked for an embedded `error` marker.
pub fn classify(content_type: &str, url: &str, body: Bytes) -> GraphResult<ApiResponse> {
    let response = if content_type.contains("json") {
        let document: Value = serde_json::from_slice(&body).map_err(|err| {
            GraphError::Encoding(ApiError::synthetic(format!("Malformed JSON body: {err}")))
        })?;
        ApiResponse::Structured(document)
    } else if content_type.contains("image/") {
        ApiResponse::Binary {
            data: body,
            mime_type: content_type.to_string(),
            url: url.to_string(),
        }
    } else {
        classify_query_string(&body)?
    };

    debug!(kind = response.kind(), "classified graph response");
    check_for_error(response)
}

/// Parses a URL-encoded body.
///
/// Pairs without a value are dropped. A body with no remaining pairs isn't a
/// query string at all. A query string without a token is treated as a
/// structured document, so an error sent this way still surfaces.
fn classify_query_string(body: &[u8]) -> GraphResult<ApiResponse> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(body)
        .into_owned()
        .filter(|(_, value)| !value.is_empty())
        .collect();

    if pairs.is_empty() {
        return Err(GraphError::Encoding(ApiError::synthetic(
            UNRECOGNIZED_ENCODING,
        )));
    }

    let first = |key: &str| {
        pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    };

    if let Some(access_token) = first(ACCESS_TOKEN_KEY) {
        return Ok(ApiResponse::TokenFragment(TokenFragment {
            access_token,
            expires: first("expires"),
        }));
    }

    // Repeated keys keep their first value.
    let mut document = Map::new();
    for (key, value) in pairs {
        document.entry(key).or_insert(Value::String(value));
    }
    Ok(ApiResponse::Structured(Value::Object(document)))
}

/// Rejects structured responses that carry a truthy `error` field.
fn check_for_error(response: ApiResponse) -> GraphResult<ApiResponse> {
    if let ApiResponse::Structured(document @ Value::Object(_)) = &response {
        if document.get("error").is_some_and(is_truthy) {
            return Err(GraphError::Api(ApiError::from_document(document.clone())));
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://graph.facebook.com/v16.0/me";

    #[test]
    fn test_json_passes_through_unchanged() {
        let body = json!({"id": "4", "name": "Mark", "likes": {"data": [1, 2]}});
        let response = classify(
            "application/json; charset=UTF-8",
            URL,
            Bytes::from(body.to_string()),
        )
        .unwrap();
        assert_eq!(response, ApiResponse::Structured(body));
    }

    #[test]
    fn test_json_error_marker_is_raised() {
        let body = json!({"error": {"message": "Unsupported get request.", "type": "GraphMethodException"}});
        let err = classify("text/javascript+json", URL, Bytes::from(body.to_string())).unwrap_err();
        match err {
            GraphError::Api(api) => {
                assert_eq!(api.message, "Unsupported get request.");
                assert_eq!(api.code, "GraphMethodException");
                assert_eq!(api.document, body);
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn test_falsy_error_is_not_raised() {
        let body = json!({"error": null, "id": "1"});
        let response = classify("application/json", URL, Bytes::from(body.to_string())).unwrap();
        assert_eq!(response.get("id"), Some(&json!("1")));
    }

    #[test]
    fn test_malformed_json_is_encoding_error() {
        let err = classify("application/json", URL, Bytes::from_static(b"{nope")).unwrap_err();
        assert!(matches!(err, GraphError::Encoding(_)));
    }

    #[test]
    fn test_image_is_binary() {
        let picture_url = "https://scontent.example.net/p.jpg?oh=abc&oe=def";
        let response = classify("image/jpeg", picture_url, Bytes::from_static(b"\xff\xd8\xff")).unwrap();
        assert_eq!(
            response,
            ApiResponse::Binary {
                data: Bytes::from_static(b"\xff\xd8\xff"),
                mime_type: "image/jpeg".to_string(),
                url: picture_url.to_string(),
            }
        );
    }

    #[test]
    fn test_image_is_never_error_checked() {
        let response = classify("image/png", URL, Bytes::from_static(b"error=1")).unwrap();
        assert!(response.as_binary().is_some());
    }

    #[test]
    fn test_query_string_token() {
        let response = classify(
            "text/plain",
            URL,
            Bytes::from_static(b"access_token=ABC&expires=100"),
        )
        .unwrap();
        let expected = TokenFragment {
            access_token: "ABC".to_string(),
            expires: Some("100".to_string()),
        };
        assert_eq!(response, ApiResponse::TokenFragment(expected.clone()));
        assert_eq!(expected.expires_in(), Some(Duration::from_secs(100)));
        assert_eq!(response.as_token(), Some("ABC"));
    }

    #[test]
    fn test_query_string_token_without_expiry() {
        let response = classify("text/plain", URL, Bytes::from_static(b"access_token=ABC")).unwrap();
        assert_eq!(
            response,
            ApiResponse::TokenFragment(TokenFragment {
                access_token: "ABC".to_string(),
                expires: None,
            })
        );
    }

    #[test]
    fn test_query_string_error() {
        let err = classify(
            "text/plain",
            URL,
            Bytes::from_static(b"error=oops&error_description=bad"),
        )
        .unwrap_err();
        match err {
            GraphError::Api(api) => {
                assert_eq!(api.message, "bad");
                assert_eq!(api.code, "oops");
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn test_query_string_without_token_is_structured() {
        let response = classify("text/plain", URL, Bytes::from_static(b"foo=bar")).unwrap();
        assert_eq!(response, ApiResponse::Structured(json!({"foo": "bar"})));
    }

    #[test]
    fn test_unrecognized_encoding() {
        let err = classify("text/plain", URL, Bytes::from_static(b"hello there")).unwrap_err();
        match err {
            GraphError::Encoding(api) => assert_eq!(api.message, UNRECOGNIZED_ENCODING),
            other => panic!("expected an encoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_is_unrecognized() {
        let err = classify("", URL, Bytes::new()).unwrap_err();
        assert!(matches!(err, GraphError::Encoding(_)));
    }
}
