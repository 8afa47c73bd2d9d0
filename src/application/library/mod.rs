mod book_service;
mod errors;
mod responses;
mod user_service;

use crate::ports::{BookRepository, LoanHistoryRepository, UserRepository};
use std::sync::Arc;

pub use book_service::{
    count_loaned_book, get_book_statistics, get_books, loan_book, return_book, save_book,
};
pub use errors::{LibraryApplicationError, Result};
pub use responses::{
    BookHistoryResponse, BookResponse, BookStatResponse, UserLoanHistoryResponse, UserResponse,
};
pub use user_service::{
    delete_user, get_user_loan_histories, get_users, save_user, update_user_name,
};

/// サービスの依存関係
///
/// データ構造として定義し、振る舞いは持たない。
/// 各サービス関数に引数として明示的に渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub book_repository: Arc<dyn BookRepository>,
    pub loan_history_repository: Arc<dyn LoanHistoryRepository>,
}
