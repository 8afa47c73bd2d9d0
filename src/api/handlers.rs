use crate::application::library::{
    self, BookResponse, BookStatResponse, ServiceDependencies, UserLoanHistoryResponse,
    UserResponse,
};
use crate::domain::commands::{
    DeleteUser, LoanBook, ReturnBook, SaveBook, SaveUser, UpdateUserName,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{error::ApiError, types::DeleteUserQuery};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// User handlers
// ============================================================================

/// POST /user - 利用者を登録
pub async fn save_user(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<SaveUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = library::save_user(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /user - 利用者一覧
pub async fn get_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = library::get_users(&state.service_deps).await?;
    Ok(Json(users))
}

/// PUT /user - 利用者名を変更
pub async fn update_user_name(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<UpdateUserName>,
) -> Result<StatusCode, ApiError> {
    library::update_user_name(&state.service_deps, cmd).await?;
    Ok(StatusCode::OK)
}

/// DELETE /user?name= - 利用者を削除
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteUserQuery>,
) -> Result<StatusCode, ApiError> {
    library::delete_user(&state.service_deps, DeleteUser { name: query.name }).await?;
    Ok(StatusCode::OK)
}

/// GET /user/loan - 利用者ごとの貸出履歴
pub async fn get_user_loan_histories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserLoanHistoryResponse>>, ApiError> {
    let histories = library::get_user_loan_histories(&state.service_deps).await?;
    Ok(Json(histories))
}

// ============================================================================
// Book handlers
// ============================================================================

/// POST /book - 書籍を登録
pub async fn save_book(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<SaveBook>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = library::save_book(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /book - 書籍一覧
pub async fn get_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = library::get_books(&state.service_deps).await?;
    Ok(Json(books))
}

/// POST /book/loan - 書籍を貸し出す
///
/// 既に貸出中の書籍は409を返す。
pub async fn loan_book(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<LoanBook>,
) -> Result<StatusCode, ApiError> {
    library::loan_book(&state.service_deps, cmd).await?;
    Ok(StatusCode::CREATED)
}

/// PUT /book/return - 書籍を返却
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<ReturnBook>,
) -> Result<StatusCode, ApiError> {
    library::return_book(&state.service_deps, cmd).await?;
    Ok(StatusCode::OK)
}

/// GET /book/loan - 貸出中の書籍数
pub async fn count_loaned_book(
    State(state): State<Arc<AppState>>,
) -> Result<Json<i64>, ApiError> {
    let count = library::count_loaned_book(&state.service_deps).await?;
    Ok(Json(count))
}

/// GET /book/stat - 分野別の蔵書数
pub async fn get_book_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookStatResponse>>, ApiError> {
    let stats = library::get_book_statistics(&state.service_deps).await?;
    Ok(Json(stats))
}
