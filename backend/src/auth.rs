//! Request guards: bearer-token authentication and the CORS origin policy.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Verifies the bearer token and attaches the caller's
/// [`Identity`](crate::identity::Identity) to the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthenticated("Authorization token missing".to_string()))?;

    let identity = state.verifier.verify(&token).await.map_err(|error| {
        tracing::debug!(%error, "token verification failed");
        ApiError::from(error)
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects browser requests from origins outside the configured allow-list.
/// Requests without an `Origin` header are same-origin or non-browser and
/// pass through.
pub async fn enforce_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !state.config.origin_allowed(origin) {
            return Err(ApiError::Forbidden("Not allowed by CORS".to_string()));
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Bearer abc.def"), Some("abc.def"))]
    #[case(Some("Bearer "), Some(""))]
    #[case(Some("bearer abc"), None)]
    #[case(Some("Basic dXNlcjpwYXNz"), None)]
    #[case(None, None)]
    fn bearer_token_requires_exact_scheme(
        #[case] raw: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut headers = HeaderMap::new();
        if let Some(value) = raw {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        assert_eq!(bearer_token(&headers), expected);
    }
}
