use crate::api::{ApiResponse, GraphApi, GraphApiConfig, GraphRequest, GraphResult, RequestArgs};
use std::time::Duration;
use tracing::debug;

/// The redirect URI used when an app doesn't configure its own.
pub const DEFAULT_REDIRECT: &str = "https://example.com/";

/// The host serving the browser-facing OAuth dialog.
pub const DEFAULT_AUTH_URL: &str = "https://www.facebook.com";

/// The endpoint, relative to the graph, for obtaining access tokens.
const ACCESS_TOKEN_ENDPOINT: &str = "oauth/access_token";

/// An app's OAuth2 identity, along with an unauthenticated client to exchange tokens through.
#[derive(Debug, Clone)]
pub struct GraphAuth {
    pub(crate) app_id: String,
    pub(crate) app_secret: String,
    pub(crate) redirect_uri: String,
    pub(crate) version: String,
    pub(crate) auth_url: String,
    api: GraphApi,
}

/// Builder for [`GraphAuth`].
#[derive(Debug, Clone)]
pub struct GraphAuthBuilder {
    app_id: String,
    app_secret: String,
    redirect_uri: Option<String>,
    auth_url: String,
    api_config: GraphApiConfig,
}

impl GraphAuthBuilder {
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.api_config = self.api_config.with_version(version);
        self
    }

    /// The graph host token exchanges are sent to.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_config = self.api_config.with_base_url(base_url);
        self
    }

    /// The host serving the OAuth dialog.
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.api_config = self.api_config.with_timeout(timeout);
        self
    }

    pub fn build(self) -> GraphResult<GraphAuth> {
        let version = self.api_config.version.clone();
        // Token exchanges are never authenticated with a user token.
        let api = GraphApi::new(GraphApiConfig {
            access_token: None,
            ..self.api_config
        })?;

        Ok(GraphAuth {
            app_id: self.app_id,
            app_secret: self.app_secret,
            redirect_uri: self
                .redirect_uri
                .unwrap_or_else(|| DEFAULT_REDIRECT.to_string()),
            version,
            auth_url: self.auth_url,
            api,
        })
    }
}

impl GraphAuth {
    /// Starts configuring an app with its id and secret.
    pub fn builder(app_id: impl Into<String>, app_secret: impl Into<String>) -> GraphAuthBuilder {
        GraphAuthBuilder {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            redirect_uri: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_config: GraphApiConfig::new(),
        }
    }

    /// An app with default redirect, version and hosts.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> GraphResult<Self> {
        Self::builder(app_id, app_secret).build()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// `extra` is merged over the standard parameters. The response is
    /// returned as-is: usually a JSON document with an `access_token`
    /// field, or a token fragment on older API versions.
    pub async fn exchange_code(&self, code: &str, extra: RequestArgs) -> GraphResult<ApiResponse> {
        let mut args = RequestArgs::from([
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.redirect_uri.clone()),
            ("client_id".to_string(), self.app_id.clone()),
            ("client_secret".to_string(), self.app_secret.clone()),
        ]);
        args.extend(extra);

        debug!(app_id = %self.app_id, "exchanging authorization code");
        self.api
            .request(GraphRequest::read(ACCESS_TOKEN_ENDPOINT).args(args))
            .await
    }

    /// Exchanges a short-lived access token for a long-lived one.
    pub async fn extend_token(&self, access_token: &str) -> GraphResult<ApiResponse> {
        let args = RequestArgs::from([
            ("client_id".to_string(), self.app_id.clone()),
            ("client_secret".to_string(), self.app_secret.clone()),
            ("grant_type".to_string(), "fb_exchange_token".to_string()),
            ("fb_exchange_token".to_string(), access_token.to_string()),
        ]);

        debug!(app_id = %self.app_id, "extending access token");
        self.api
            .request(GraphRequest::read(ACCESS_TOKEN_ENDPOINT).args(args))
            .await
    }
}
