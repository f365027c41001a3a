use reqwest::Method;
use std::collections::BTreeMap;

/// Key-value arguments sent either as query parameters or as a form body.
pub type RequestArgs = BTreeMap<String, String>;

/// The reserved argument key the access token is sent under.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Whether a call reads from or writes to the graph.
///
/// This decides where the access token goes: into the query for reads,
/// or into the body for writes. It is independent of the HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Read,
    Write,
}

/// A file attached to a write as a multipart part.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// The form field name, e.g. `source`.
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// A single call against the graph, before authentication is applied.
#[derive(Debug, Clone)]
pub struct GraphRequest {
    pub(crate) path: String,
    pub(crate) intent: Intent,
    pub(crate) args: RequestArgs,
    pub(crate) post_args: Option<RequestArgs>,
    pub(crate) files: Vec<Attachment>,
    pub(crate) method: Option<Method>,
}

impl GraphRequest {
    /// A read against `path`. Arguments are sent as query parameters.
    pub fn read(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            intent: Intent::Read,
            args: RequestArgs::new(),
            post_args: None,
            files: Vec::new(),
            method: None,
        }
    }

    /// A write against `path`. Defaults to `POST` with an empty form body.
    pub fn write(path: impl Into<String>) -> Self {
        Self {
            intent: Intent::Write,
            post_args: Some(RequestArgs::new()),
            method: Some(Method::POST),
            ..Self::read(path)
        }
    }

    /// Sets the query parameters.
    pub fn args(mut self, args: RequestArgs) -> Self {
        self.args = args;
        self
    }

    /// Sets a single query parameter.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Sets the body parameters.
    pub fn post_args(mut self, post_args: RequestArgs) -> Self {
        self.post_args = Some(post_args);
        self
    }

    pub fn file(mut self, attachment: Attachment) -> Self {
        self.files.push(attachment);
        self
    }

    /// Overrides the HTTP method. Intent (and so token placement) is unchanged.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// The method this request goes out with: the override, or `GET`.
    pub fn http_method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }
}

/// Places the access token according to the call's intent.
///
/// Writes receive the token in their body arguments, which are created if absent.
/// Reads receive it as a query parameter.
pub fn authenticate(
    args: &mut RequestArgs,
    post_args: &mut Option<RequestArgs>,
    intent: Intent,
    access_token: Option<&str>,
) {
    let Some(token) = access_token else {
        return;
    };

    let target = match intent {
        Intent::Write => post_args.get_or_insert_with(RequestArgs::new),
        Intent::Read => args,
    };
    target.insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
}
