//! A client for the Graph API.
//!
//! [`GraphApi`] issues calls against the graph and normalizes every response,
//! whether JSON, an image, or a URL-encoded token, into an [`ApiResponse`].
//! Failures of any kind surface as a single [`GraphError`].
//! [`GraphAuth`] drives the OAuth2 authorization-code flow on top of it.
//!
//! ```no_run
//! use graphctl::{GraphApi, RequestArgs};
//!
//! # async fn run() -> graphctl::GraphResult<()> {
//! let api = GraphApi::with_access_token("EAAB...")?;
//! let me = api.get_object("me", RequestArgs::new()).await?;
//! println!("{:?}", me.get("name"));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod oauth;

pub use api::{
    ApiError, ApiResponse, Attachment, GraphApi, GraphApiConfig, GraphError, GraphRequest,
    GraphResult, Intent, RequestArgs, TokenFragment,
};
pub use oauth::GraphAuth;
