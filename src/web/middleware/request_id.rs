//! # Request ID Middleware
//!
//! Generates unique request IDs for tracing and debugging.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Add request ID middleware.
///
/// Generates a unique request ID for each HTTP request and adds it to:
/// - Response headers as `X-Request-ID`
/// - Request extensions for use by handlers
pub async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Request ID wrapper for extension storage.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_as_str() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = RequestId(uuid_str.to_string());
        assert_eq!(id.as_str(), uuid_str);
    }

    #[test]
    fn test_request_id_clone() {
        let original = RequestId("original-id".to_string());
        let cloned = original.clone();
        assert_eq!(original.as_str(), cloned.as_str());
    }
}
