use super::lookup::{display_value, lookup_present};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fields consulted, in order, when resolving a human-readable message.
const MESSAGE_FIELDS: [&str; 3] = ["error_description", "error.message", "error_msg"];

/// Fields consulted, in order, when resolving a machine-readable code.
const CODE_FIELDS: [&str; 3] = ["error_code", "error.type", "error.code"];

/// An error reported by the Graph API itself, alongside the document that carried it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}{}", code_suffix(.code))]
pub struct ApiError {
    /// Machine-readable error code or type. May be empty.
    pub code: String,
    /// Human-readable message, resolved best-effort from the document.
    pub message: String,
    /// The raw error document, passed through for diagnostics.
    pub document: Value,
}

impl ApiError {
    /// Resolves the code and message from an error document.
    ///
    /// If no known message field is present, the message falls back to the
    /// document itself.
    pub fn from_document(document: Value) -> Self {
        let message = MESSAGE_FIELDS
            .iter()
            .find_map(|path| lookup_present(&document, path))
            .map(display_value)
            .unwrap_or_else(|| display_value(&document));

        // OAuth-style errors carry their code as a bare string: `{"error": "invalid_request"}`.
        let code = CODE_FIELDS
            .iter()
            .find_map(|path| lookup_present(&document, path))
            .or_else(|| lookup_present(&document, "error").filter(|e| e.is_string()))
            .map(display_value)
            .unwrap_or_default();

        Self {
            code,
            message,
            document,
        }
    }

    /// Wraps a locally produced description as an error document of its own.
    pub fn synthetic(description: impl Into<String>) -> Self {
        Self::from_document(Value::String(description.into()))
    }
}

/// Renders the code after a message, when there is one.
fn code_suffix(code: &str) -> String {
    if code.is_empty() {
        String::new()
    } else {
        format!(" ({code})")
    }
}

/// Every way a Graph API call can fail.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The request never produced a usable response: connection failure,
    /// timeout, or an error status whose body was not a JSON document.
    #[error("transport error: {error}")]
    Transport {
        status: Option<StatusCode>,
        error: ApiError,
    },

    /// The response was neither JSON, an image, nor a query string.
    #[error("unrecognized response encoding: {0}")]
    Encoding(ApiError),

    /// The API returned an error document.
    #[error("graph API error: {0}")]
    Api(ApiError),

    /// A write was attempted without an access token.
    #[error("write operations require an access token")]
    MissingAccessToken,

    /// A signed request could not be decoded or failed verification.
    #[error("invalid signed request: {0}")]
    InvalidSignedRequest(&'static str),

    /// The HTTP client (or a multipart part) could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GraphError {
    /// The API error document carried by transport, encoding and API errors.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            GraphError::Transport { error, .. }
            | GraphError::Encoding(error)
            | GraphError::Api(error) => Some(error),
            _ => None,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
