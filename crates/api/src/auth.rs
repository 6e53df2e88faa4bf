//! Bearer token extractor guarding mutating routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use identity::IdentityProvider;
use item_store::ItemStore;

use crate::AppState;
use crate::error::ApiError;

/// The verified subject of a request's bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub subject: String,
}

impl<S, I> FromRequestParts<Arc<AppState<S, I>>> for Authenticated
where
    S: ItemStore + 'static,
    I: IdentityProvider + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S, I>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let subject = state
            .service
            .verify_token(token)
            .await
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        tracing::debug!(%subject, "request authenticated");
        Ok(Self { subject })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthorized("malformed authorization header".to_string()))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::Unauthorized(
            "expected a bearer token".to_string(),
        ));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/items");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extracts_bearer_token() {
        let parts = parts(Some("Bearer abc.def"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let parts = parts(Some("bearer abc"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_other_schemes_rejected() {
        for value in ["Basic dXNlcjpwdw==", "Bearer", "Bearer   ", "token"] {
            assert!(
                matches!(bearer_token(&parts(Some(value))), Err(ApiError::Unauthorized(_))),
                "{value}"
            );
        }
    }
}
