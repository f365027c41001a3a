mod authorize;
mod oauth_client;
mod signed_request;

pub use authorize::{code_from_redirect, parse_redirect_fragment, DEFAULT_SCOPE};
pub use oauth_client::{GraphAuth, GraphAuthBuilder, DEFAULT_AUTH_URL, DEFAULT_REDIRECT};
pub use signed_request::parse_signed_request;
