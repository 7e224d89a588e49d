use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    models::{QuestionnaireError, ValidationError},
    session::{MatcherError, SessionError, StateError},
};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Invalid user information: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Questionnaire(#[from] QuestionnaireError),

    #[error("Contract violation: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            // A session without a matcher has to be restarted, like an unknown one
            AppError::Session(_) => StatusCode::NOT_FOUND,
            AppError::Matcher(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::State(StateError::UnknownStage(_) | StateError::ReservedStage(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::State(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::Questionnaire(_) | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
