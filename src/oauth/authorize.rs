use super::oauth_client::GraphAuth;
use crate::api::{ApiError, GraphError, GraphResult, RequestArgs, TokenFragment, ACCESS_TOKEN_KEY};
use serde_json::{Map, Value};
use url::{form_urlencoded, Url};

/// The permission requested when the caller doesn't ask for any.
pub const DEFAULT_SCOPE: &str = "public_profile";

impl GraphAuth {
    /// Builds the URL of the OAuth dialog a user should be sent to.
    ///
    /// `client_id`, `redirect_uri` and `scope` are always present. Any key in
    /// `extra` (e.g. `state` or `response_type`) replaces the default of the same
    /// name, or is appended after them.
    pub fn authorization_url(&self, perms: Option<&str>, extra: RequestArgs) -> String {
        let mut params: Vec<(String, String)> = vec![
            ("client_id".to_string(), self.app_id.clone()),
            ("redirect_uri".to_string(), self.redirect_uri.clone()),
            (
                "scope".to_string(),
                perms
                    .filter(|perms| !perms.is_empty())
                    .unwrap_or(DEFAULT_SCOPE)
                    .to_string(),
            ),
        ];

        for (key, value) in extra {
            match params.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, slot)) => *slot = value,
                None => params.push((key, value)),
            }
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{}/{}/dialog/oauth?{}", self.auth_url, self.version, query)
    }
}

/// Extracts the access token from a client-side redirect, where the
/// dialog appends `#access_token=...&expires_in=...` to the redirect URI.
pub fn parse_redirect_fragment(redirect: &str) -> GraphResult<TokenFragment> {
    let location = Url::parse(redirect)?;
    let fragment = collect_pairs(location.fragment().unwrap_or_default().as_bytes());

    // A denied dialog reports its error in the fragment or the query, depending on response type.
    check_redirect_error(&fragment)?;
    check_redirect_error(&collect_pairs(location.query().unwrap_or_default().as_bytes()))?;

    match fragment.get(ACCESS_TOKEN_KEY) {
        Some(access_token) => Ok(TokenFragment {
            access_token: access_token.clone(),
            expires: fragment
                .get("expires_in")
                .or_else(|| fragment.get("expires"))
                .cloned(),
        }),
        None => Err(GraphError::Encoding(ApiError::synthetic(
            "Redirect fragment did not contain an access token",
        ))),
    }
}

/// Extracts the authorization code from a server-side redirect.
pub fn code_from_redirect(redirect: &str) -> GraphResult<String> {
    let location = Url::parse(redirect)?;
    let query = collect_pairs(location.query().unwrap_or_default().as_bytes());
    check_redirect_error(&query)?;

    query.get("code").cloned().ok_or_else(|| {
        GraphError::Encoding(ApiError::synthetic(
            "Redirect did not contain an authorization code",
        ))
    })
}

/// Collects URL-encoded pairs, keeping the first non-empty value for each key.
fn collect_pairs(encoded: &[u8]) -> RequestArgs {
    let mut pairs = RequestArgs::new();
    for (key, value) in form_urlencoded::parse(encoded).into_owned() {
        if !value.is_empty() {
            pairs.entry(key).or_insert(value);
        }
    }
    pairs
}

fn check_redirect_error(pairs: &RequestArgs) -> GraphResult<()> {
    if !pairs.contains_key("error") {
        return Ok(());
    }

    let document: Map<String, Value> = pairs
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    Err(GraphError::Api(ApiError::from_document(Value::Object(document))))
}
