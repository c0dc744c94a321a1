//! Request authentication.
//!
//! Handlers take an [`AuthTuple`] argument; the active [`AuthModule`] decides
//! how it is resolved from the request.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use agentgate_core::ConfigError;

use crate::error::ApiError;
use crate::state::AppState;

pub const DEFAULT_USER_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const DEFAULT_USER_NAME: &str = "lightspeed-user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthModule {
    /// Accept every request.
    Noop,
    /// Accept any request that carries a bearer token.
    NoopWithToken,
}

impl FromStr for AuthModule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noop" => Ok(AuthModule::Noop),
            "noop-with-token" => Ok(AuthModule::NoopWithToken),
            other => Err(ConfigError::UnknownAuthModule(other.to_string())),
        }
    }
}

impl fmt::Display for AuthModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthModule::Noop => write!(f, "noop"),
            AuthModule::NoopWithToken => write!(f, "noop-with-token"),
        }
    }
}

/// Identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTuple {
    pub user_id: String,
    pub username: String,
}

fn has_bearer_token(parts: &Parts) -> bool {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty())
}

fn user_id_param(parts: &Parts) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).ok()?;
    params.get("user_id").filter(|id| !id.is_empty()).cloned()
}

impl AuthModule {
    pub fn authenticate(&self, parts: &Parts) -> Result<AuthTuple, ApiError> {
        if *self == AuthModule::NoopWithToken && !has_bearer_token(parts) {
            return Err(ApiError::Unauthorized(
                "No Authorization header found".to_string(),
            ));
        }
        Ok(AuthTuple {
            user_id: user_id_param(parts).unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            username: DEFAULT_USER_NAME.to_string(),
        })
    }
}

impl FromRequestParts<Arc<AppState>> for AuthTuple {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.auth.authenticate(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_parse_modules() {
        assert_eq!("noop".parse::<AuthModule>().unwrap(), AuthModule::Noop);
        assert_eq!(
            "noop-with-token".parse::<AuthModule>().unwrap(),
            AuthModule::NoopWithToken
        );
        assert!("k8s".parse::<AuthModule>().is_err());
    }

    #[test]
    fn test_noop_defaults() {
        let auth = AuthModule::Noop.authenticate(&parts("/v1/query", None)).unwrap();
        assert_eq!(auth.user_id, DEFAULT_USER_ID);
        assert_eq!(auth.username, DEFAULT_USER_NAME);
    }

    #[test]
    fn test_noop_user_id_from_query() {
        let auth = AuthModule::Noop
            .authenticate(&parts("/v1/query?user_id=alice", None))
            .unwrap();
        assert_eq!(auth.user_id, "alice");
    }

    #[test]
    fn test_token_required() {
        let err = AuthModule::NoopWithToken
            .authenticate(&parts("/v1/query", None))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err = AuthModule::NoopWithToken
            .authenticate(&parts("/v1/query", Some("Basic abc")))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let auth = AuthModule::NoopWithToken
            .authenticate(&parts("/v1/query?user_id=bob", Some("Bearer s3cret")))
            .unwrap();
        assert_eq!(auth.user_id, "bob");

        let err = AuthModule::NoopWithToken
            .authenticate(&parts("/v1/query", Some("Bearer  ")))
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
