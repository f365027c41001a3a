mod client;
mod error;
pub mod lookup;
mod request;
mod response;

pub use client::{GraphApi, GraphApiConfig, DEFAULT_GRAPH_URL, DEFAULT_VERSION};
pub use error::{ApiError, GraphError, GraphResult};
pub use request::{authenticate, Attachment, GraphRequest, Intent, RequestArgs, ACCESS_TOKEN_KEY};
pub use response::{classify, ApiResponse, TokenFragment};
