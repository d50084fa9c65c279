use std::collections::HashSet;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use storage::services::Caller;
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ACCESS_PASSWORD_HEADER: &str = "x-access-password";

#[derive(Clone)]
pub struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str) -> Self {
        let keys = keys_str
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self { keys }
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Who is calling, plus the access password they supplied for a gated
/// resource, if any.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub caller: Caller,
    pub password: Option<String>,
}

impl CallerContext {
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CallerContext {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, WebError> {
        let caller = resolve_caller(&parts.headers, &state.api_keys)?;
        let password = header_str(&parts.headers, ACCESS_PASSWORD_HEADER).map(String::from);

        Ok(Self { caller, password })
    }
}

fn resolve_caller(headers: &HeaderMap, api_keys: &ApiKeys) -> Result<Caller, WebError> {
    if let Some(authorization) = header_str(headers, AUTHORIZATION.as_str()) {
        let token = authorization
            .strip_prefix("Bearer ")
            .ok_or(WebError::Unauthorized)?;
        if api_keys.is_valid(token.trim()) {
            return Ok(Caller::System);
        }
        tracing::warn!("Invalid API key attempt");
        return Err(WebError::Unauthorized);
    }

    match header_str(headers, USER_ID_HEADER) {
        Some(raw) => Uuid::parse_str(raw.trim())
            .map(Caller::User)
            .map_err(|_| WebError::BadRequest(format!("{USER_ID_HEADER} must be a UUID"))),
        None => Ok(Caller::Anonymous),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys() -> ApiKeys {
        ApiKeys::from_comma_separated(" alpha, ,beta ")
    }

    #[test]
    fn test_keys_are_trimmed_and_blank_entries_skipped() {
        let keys = keys();
        assert!(keys.is_valid("alpha"));
        assert!(keys.is_valid("beta"));
        assert!(!keys.is_valid(""));
    }

    #[test]
    fn test_valid_bearer_is_system_caller() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer beta"));
        assert_eq!(resolve_caller(&headers, &keys()).unwrap(), Caller::System);
    }

    #[test]
    fn test_unknown_bearer_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer gamma"));
        assert!(matches!(
            resolve_caller(&headers, &keys()),
            Err(WebError::Unauthorized)
        ));
    }

    #[test]
    fn test_user_header_identifies_user() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(resolve_caller(&headers, &keys()).unwrap(), Caller::User(id));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            resolve_caller(&headers, &keys()),
            Err(WebError::BadRequest(_))
        ));
    }

    #[test]
    fn test_no_headers_is_anonymous() {
        assert_eq!(
            resolve_caller(&HeaderMap::new(), &keys()).unwrap(),
            Caller::Anonymous
        );
    }
}
