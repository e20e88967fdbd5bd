use crate::security::{AuthMethod, AuthResult};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use tracing::debug;

/// The authenticated caller of a request, placed in the request extensions
/// by the security gate.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject: String,
    pub scopes: Vec<String>,
    pub method: AuthMethod,
    /// Identifier the rate limiter counted this request against
    pub client_id: String,
}

impl Session {
    /// Builds a session out of a successful authentication.
    pub fn from_auth(auth: AuthResult, client_id: String) -> Option<Self> {
        if !auth.authenticated {
            return None;
        }
        Some(Session {
            subject: auth.subject?,
            scopes: auth.scopes,
            method: auth.method?,
            client_id,
        })
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

#[derive(Debug)]
pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = SessionExtractionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(session.clone()),
            None => {
                debug!("No session in request extensions for {}", parts.uri.path());
                Err(SessionExtractionError::AccessDenied)
            }
        }
    }
}
