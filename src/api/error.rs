use crate::application::library::LibraryApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LibraryApplicationError);

impl From<LibraryApplicationError> for ApiError {
    fn from(err: LibraryApplicationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 400 Bad Request - 入力値が不正
            LibraryApplicationError::Validation(ref e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }

            // 404 Not Found - 操作対象が存在しない
            LibraryApplicationError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            LibraryApplicationError::LoanHistoryNotFound => (
                StatusCode::NOT_FOUND,
                "LOAN_HISTORY_NOT_FOUND",
                "No active loan for this book".to_string(),
            ),

            // 409 Conflict - 既に貸出中
            LibraryApplicationError::BookAlreadyLoaned => (
                StatusCode::CONFLICT,
                "BOOK_ALREADY_LOANED",
                "Book is already on loan".to_string(),
            ),

            // 422 Unprocessable Entity
            LibraryApplicationError::InvalidLoanState(ref msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_LOAN_STATE",
                msg.clone(),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LibraryApplicationError::UserRepositoryError(ref e) => {
                tracing::error!("User repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "USER_REPOSITORY_ERROR",
                    "Failed to access users".to_string(),
                )
            }
            LibraryApplicationError::BookRepositoryError(ref e) => {
                tracing::error!("Book repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "BOOK_REPOSITORY_ERROR",
                    "Failed to access books".to_string(),
                )
            }
            LibraryApplicationError::LoanHistoryRepositoryError(ref e) => {
                tracing::error!("Loan history repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOAN_HISTORY_REPOSITORY_ERROR",
                    "Failed to access loan histories".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
