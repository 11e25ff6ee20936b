use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::protocol::ErrorBody;

/// Every way a chat request can fail before streaming begins.
///
/// The variants exist for logging only. Callers always see the same
/// 500 response with [`crate::protocol::GENERIC_ERROR_MESSAGE`].
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("API key is not configured")]
    ConfigurationMissing,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Query too large: {tokens} tokens (limit {limit})")]
    QueryTooLarge { tokens: usize, limit: usize },

    #[error("Query flagged by moderation")]
    ContentFlagged,

    #[error("Malformed moderation response: {0}")]
    MalformedModeration(String),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::generic())
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GENERIC_ERROR_MESSAGE;
    use actix_web::body::MessageBody;

    #[test]
    fn test_every_kind_collapses_to_generic_500() {
        let errors = vec![
            ProxyError::ConfigurationMissing,
            ProxyError::InvalidInput("messages is empty".to_string()),
            ProxyError::QueryTooLarge {
                tokens: 4001,
                limit: 4000,
            },
            ProxyError::ContentFlagged,
            ProxyError::Upstream {
                status: 429,
                body: "{\"error\":{\"message\":\"rate limited\"}}".to_string(),
            },
        ];

        for err in errors {
            let resp = err.error_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = resp.into_body().try_into_bytes().unwrap();
            let body: ErrorBody = serde_json::from_slice(&body).unwrap();
            assert_eq!(body.error, GENERIC_ERROR_MESSAGE);
        }
    }

    #[test]
    fn test_reason_kept_in_display() {
        let err = ProxyError::Upstream {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 401: invalid api key");
    }
}
