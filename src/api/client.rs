use super::error::{ApiError, GraphError, GraphResult};
use super::request::{authenticate, Attachment, GraphRequest, RequestArgs};
use super::response::{classify, ApiResponse};
use reqwest::{header, multipart, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// The API version used unless overridden.
pub const DEFAULT_VERSION: &str = "v16.0";

/// The Graph API host all calls are made against.
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";

/// Settings fixed for the lifetime of a [`GraphApi`].
#[derive(Debug, Clone)]
pub struct GraphApiConfig {
    pub access_token: Option<String>,
    pub timeout: Option<Duration>,
    pub version: String,
    pub base_url: String,
}

impl Default for GraphApiConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            timeout: None,
            version: DEFAULT_VERSION.to_string(),
            base_url: DEFAULT_GRAPH_URL.to_string(),
        }
    }
}

impl GraphApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Applies to every call made by the resulting client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Points the client at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// A client for the Graph API.
///
/// Every call issues exactly one HTTP request and yields either an
/// [`ApiResponse`] or a [`GraphError`]. The client holds no mutable state,
/// so it can be shared freely between tasks.
#[derive(Debug, Clone)]
pub struct GraphApi {
    config: GraphApiConfig,
    http_client: reqwest::Client,
}

impl GraphApi {
    pub fn new(config: GraphApiConfig) -> GraphResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(GraphError::Client)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Creates a client authenticated with the given access token and default settings.
    pub fn with_access_token(access_token: impl Into<String>) -> GraphResult<Self> {
        Self::new(GraphApiConfig::new().with_access_token(access_token))
    }

    pub fn config(&self) -> &GraphApiConfig {
        &self.config
    }

    /// The endpoint for a resource path under the given API version.
    pub fn build_url(&self, path: &str, version: &str) -> String {
        format!("{}/{}/{}", self.config.base_url, version, path)
    }

    /// Authenticates and issues a single request.
    pub async fn request(&self, request: GraphRequest) -> GraphResult<ApiResponse> {
        let method = request.http_method();
        let GraphRequest {
            path,
            intent,
            mut args,
            mut post_args,
            files,
            ..
        } = request;

        // We'll place our token according to intent, not method: a DELETE is still a write.
        authenticate(&mut args, &mut post_args, intent, self.access_token());

        // The query string is left out of our logs, as it may carry the token.
        let url = self.build_url(&path, &self.config.version);
        debug!(%method, %url, ?intent, "issuing graph request");
        self.execute(&url, args, post_args, files, method).await
    }

    /// Fetches a single object by id.
    pub async fn get_object(&self, id: &str, args: RequestArgs) -> GraphResult<ApiResponse> {
        self.request(GraphRequest::read(id).args(args)).await
    }

    /// Fetches several objects in one call. The result is keyed by id.
    pub async fn get_objects<I, S>(&self, ids: I, mut args: RequestArgs) -> GraphResult<ApiResponse>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        args.insert("ids".to_string(), joined);
        self.request(GraphRequest::read("").args(args)).await
    }

    /// Creates or updates a connection of `parent_id`, e.g. `me/feed`.
    pub async fn put_object(
        &self,
        parent_id: &str,
        connection: &str,
        data: RequestArgs,
    ) -> GraphResult<ApiResponse> {
        self.put_object_with_files(parent_id, connection, data, Vec::new())
            .await
    }

    /// As [`GraphApi::put_object`], attaching files as multipart parts.
    pub async fn put_object_with_files(
        &self,
        parent_id: &str,
        connection: &str,
        data: RequestArgs,
        files: Vec<Attachment>,
    ) -> GraphResult<ApiResponse> {
        self.require_access_token()?;

        let request = files.into_iter().fold(
            GraphRequest::write(format!("{parent_id}/{connection}")).post_args(data),
            GraphRequest::file,
        );
        self.request(request).await
    }

    /// Deletes an object.
    pub async fn delete_object(&self, id: &str) -> GraphResult<ApiResponse> {
        self.require_access_token()?;
        self.request(GraphRequest::write(id).method(Method::DELETE))
            .await
    }

    fn access_token(&self) -> Option<&str> {
        self.config
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    fn require_access_token(&self) -> GraphResult<()> {
        self.access_token()
            .map(|_| ())
            .ok_or(GraphError::MissingAccessToken)
    }

    /// Sends the request and normalizes whatever comes back.
    async fn execute(
        &self,
        url: &str,
        args: RequestArgs,
        post_args: Option<RequestArgs>,
        files: Vec<Attachment>,
        method: Method,
    ) -> GraphResult<ApiResponse> {
        // Read arguments always travel in the query string.
        let mut builder = self.http_client.request(method, url).query(&args);

        // Files force a multipart body; otherwise, any write arguments are sent as a form.
        if !files.is_empty() {
            builder = builder.multipart(multipart_form(post_args, files)?);
        } else if let Some(post_args) = post_args {
            builder = builder.form(&post_args);
        }

        // Errors are stripped of their URL, which may carry the access token.
        let response = builder.send().await.map_err(|err| {
            let err = err.without_url();
            warn!(%url, error = %err, "graph request failed in transport");
            GraphError::Transport {
                status: err.status(),
                error: ApiError::synthetic(err.to_string()),
            }
        })?;

        // We need the status, content type and final URL (after redirects) before
        // the body consumes our response.
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let resolved_url = response.url().to_string();
        let body = response.bytes().await.map_err(|err| GraphError::Transport {
            status: Some(status),
            error: ApiError::synthetic(err.without_url().to_string()),
        })?;

        if !status.is_success() {
            // Error statuses usually still carry a JSON error document.
            // If not, all we can report is the status and whatever text came back.
            let error = match serde_json::from_slice::<Value>(&body) {
                Ok(document) => GraphError::Api(ApiError::from_document(document)),
                Err(_) => GraphError::Transport {
                    status: Some(status),
                    error: ApiError::synthetic(format!(
                        "HTTP {status}: {}",
                        String::from_utf8_lossy(&body)
                    )),
                },
            };
            warn!(%url, %status, %error, "graph request returned an error status");
            return Err(error);
        }

        // Finally, let's interpret the body by its declared content type.
        classify(&content_type, &resolved_url, body).inspect_err(|error| {
            warn!(%url, %error, "graph request returned an error");
        })
    }
}

/// Combines body arguments and attachments into a single multipart form.
fn multipart_form(
    post_args: Option<RequestArgs>,
    files: Vec<Attachment>,
) -> GraphResult<multipart::Form> {
    let mut form = multipart::Form::new();
    for (key, value) in post_args.unwrap_or_default() {
        form = form.text(key, value);
    }
    for file in files {
        let part = multipart::Part::bytes(file.data)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)
            .map_err(GraphError::Client)?;
        form = form.part(file.field, part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let api = GraphApi::new(GraphApiConfig::new()).unwrap();
        assert_eq!(
            api.build_url("123/friends", "v16.0"),
            "https://graph.facebook.com/v16.0/123/friends"
        );
        assert_eq!(api.build_url("", "v2.0"), "https://graph.facebook.com/v2.0/");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = GraphApiConfig::new().with_base_url("http://127.0.0.1:8080/");
        let api = GraphApi::new(config).unwrap();
        assert_eq!(api.build_url("me", "v16.0"), "http://127.0.0.1:8080/v16.0/me");
    }

    #[test]
    fn test_config_defaults() {
        let config = GraphApiConfig::new();
        assert_eq!(config.version, DEFAULT_VERSION);
        assert_eq!(config.base_url, DEFAULT_GRAPH_URL);
        assert!(config.access_token.is_none());
        assert!(config.timeout.is_none());
    }

    #[tokio::test]
    async fn test_put_without_token_fails_fast() {
        let api = GraphApi::new(GraphApiConfig::new()).unwrap();
        let err = api
            .put_object("me", "feed", RequestArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingAccessToken));
    }

    #[tokio::test]
    async fn test_empty_token_counts_as_missing() {
        let api = GraphApi::new(GraphApiConfig::new().with_access_token("")).unwrap();
        let err = api.delete_object("123").await.unwrap_err();
        assert!(matches!(err, GraphError::MissingAccessToken));
    }
}
