use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No session token - log in first")]
    MissingToken,

    #[error("No user in session - fetch the current user first")]
    NotLoggedIn,

    /// The session was logged out while the request was in flight; the
    /// response was discarded.
    #[error("Logged out while the request was in flight")]
    LoggedOut,

    /// Phase 1 of a purchase created the order but completing it failed.
    /// The order is left pending server-side and can be completed later.
    #[error("Order {order_id} was created but not completed: {source}")]
    OrderNotCompleted {
        order_id: i64,
        #[source]
        source: Box<ApiError>,
    },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True when the server rejected the credentials, including a purchase
    /// whose completion step was rejected.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Unauthorized => true,
            ApiError::OrderNotCompleted { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// Id of an order that exists server-side but was never completed.
    pub fn pending_order_id(&self) -> Option<i64> {
        match self {
            ApiError::OrderNotCompleted { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }
}
