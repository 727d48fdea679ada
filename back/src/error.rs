use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use todo_api::v1::ErrorBody;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid theme: {0}")]
    UnknownTheme(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Store(StoreError::EmptyTitle | StoreError::NestingTooDeep) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Store(StoreError::NotFound(_) | StoreError::ParentNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            AppError::UnknownTheme(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };

        let body = ErrorBody {
            error: self.to_string(),
            code: String::from(code),
        };

        (status, Json(body)).into_response()
    }
}
