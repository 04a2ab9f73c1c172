//! `ApiError`: maps `credentials`/`protocol`/`upstream` errors to an HTTP status code and an
//! envelope shaped per route family, following the teacher's `LlmError`/`AnthropicErrorResponse`
//! split.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Whether the caller expects an Anthropic-shaped or OpenAI-shaped error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Anthropic,
    OpenAi,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Credentials(#[from] credentials::Error),

    #[error(transparent)]
    Protocol(#[from] protocol::Error),

    #[error(transparent)]
    Upstream(#[from] upstream::Error),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Credentials(err) => credentials_status(err),
            Self::Protocol(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(upstream::Error::Status { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Upstream(upstream::Error::Credentials(inner)) => credentials_status(inner),
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Credentials(err) => credentials_error_type(err),
            Self::Protocol(_) | Self::BadRequest(_) => "invalid_request_error",
            Self::Upstream(upstream::Error::Credentials(inner)) => credentials_error_type(inner),
            Self::Upstream(_) => "api_error",
        }
    }

    /// Wraps the error together with the envelope shape the route should use to render it.
    pub fn into_response_for(self, envelope: Envelope) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();
        let message = self.to_string();

        match envelope {
            Envelope::OpenAi => {
                let body = OpenAiError {
                    error: OpenAiErrorDetail {
                        message,
                        r#type: error_type,
                        code: status.as_u16(),
                    },
                };
                (status, Json(body)).into_response()
            }
            Envelope::Anthropic => {
                let body = AnthropicError {
                    r#type: "error",
                    error: AnthropicErrorDetail {
                        r#type: error_type,
                        message,
                    },
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

fn credentials_status(err: &credentials::Error) -> StatusCode {
    match err {
        credentials::Error::NotAuthenticated | credentials::Error::GrantRevoked => StatusCode::UNAUTHORIZED,
        credentials::Error::SubscriptionMissing => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn credentials_error_type(err: &credentials::Error) -> &'static str {
    match err {
        credentials::Error::NotAuthenticated | credentials::Error::GrantRevoked => "authentication_error",
        credentials::Error::SubscriptionMissing => "permission_error",
        _ => "api_error",
    }
}

/// Default envelope for routes that don't carry Anthropic semantics (models, health, chat).
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_for(Envelope::OpenAi)
    }
}

#[derive(Debug, Serialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Serialize)]
struct OpenAiErrorDetail {
    message: String,
    r#type: &'static str,
    code: u16,
}

#[derive(Debug, Serialize)]
struct AnthropicError {
    r#type: &'static str,
    error: AnthropicErrorDetail,
}

#[derive(Debug, Serialize)]
struct AnthropicErrorDetail {
    r#type: &'static str,
    message: String,
}
