use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::DashError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        (code, Json(ErrBody { error: self.to_string() })).into_response()
    }
}

impl From<DashError> for AppError {
    fn from(err: DashError) -> Self {
        match err {
            DashError::Validation { .. } | DashError::InvalidTransition { .. } => {
                AppError::BadRequest(err.to_string())
            }
            DashError::Prediction { .. } => AppError::Unprocessable(err.to_string()),
            DashError::Config { .. }
            | DashError::ModelLoad { .. }
            | DashError::Serialization { .. }
            | DashError::Io { .. }
            | DashError::Internal { .. } => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_request_errors_to_client_statuses() {
        let validation: AppError = DashError::validation("AGE", "out of range").into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let prediction: AppError = DashError::prediction("unseen category").into();
        assert_eq!(prediction.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let internal: AppError = DashError::internal("boom").into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
