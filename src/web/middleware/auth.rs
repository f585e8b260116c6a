//! # Authentication Middleware
//!
//! API-key authentication for the protected routes. Keys are accepted as a
//! bearer token or in the configured header, and resolve to a subject label
//! that handlers record as the owner of created generations.
//!
//! Always injects an [`AuthContext`] into request extensions so handlers
//! can read the subject without re-checking credentials.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::web::state::AppState;
use crate::web::types::ApiError;

/// How the request was authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    ApiKey,
    Disabled,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Subject label from the key registry; `None` when auth is disabled
    pub subject: Option<String>,
    pub method: AuthMethod,
}

impl AuthContext {
    /// Permissive context used when authentication is disabled.
    pub fn disabled_context() -> Self {
        Self {
            subject: None,
            method: AuthMethod::Disabled,
        }
    }
}

/// Authentication middleware applied to protected routes.
///
/// Behavior:
/// - Auth disabled → injects `AuthContext::disabled_context()`
/// - Bearer token or API key header present → validated against the key registry
/// - Missing or unknown credentials → 401
pub async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_config = &state.config.web.auth;

    if !auth_config.enabled {
        request
            .extensions_mut()
            .insert(AuthContext::disabled_context());
        return Ok(next.run(request).await);
    }

    // Bearer token, rejecting non-UTF-8 headers explicitly
    let bearer_token = match request.headers().get("authorization") {
        Some(header) => match header.to_str() {
            Ok(value) => value.strip_prefix("Bearer ").map(|t| t.to_string()),
            Err(_) => {
                warn!("Authorization header contains non-UTF-8 bytes");
                return Err(ApiError::Unauthorized);
            }
        },
        None => None,
    };

    // API key header, same treatment
    let api_key = match request.headers().get(auth_config.api_key_header.as_str()) {
        Some(header) => match header.to_str() {
            Ok(value) => Some(value.to_string()),
            Err(_) => {
                warn!("API key header contains non-UTF-8 bytes");
                return Err(ApiError::Unauthorized);
            }
        },
        None => None,
    };

    let presented = bearer_token.or(api_key).ok_or_else(|| {
        warn!("Request missing authentication credentials");
        ApiError::Unauthorized
    })?;

    let subject = auth_config.api_keys.get(&presented).ok_or_else(|| {
        warn!("Request presented an unknown API key");
        ApiError::Unauthorized
    })?;

    debug!(subject = %subject, "Request authenticated");

    request.extensions_mut().insert(AuthContext {
        subject: Some(subject.clone()),
        method: AuthMethod::ApiKey,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_context_has_no_subject() {
        let ctx = AuthContext::disabled_context();
        assert!(ctx.subject.is_none());
        assert_eq!(ctx.method, AuthMethod::Disabled);
    }
}
