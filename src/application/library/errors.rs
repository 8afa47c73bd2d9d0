use crate::domain::ValidationError;
use thiserror::Error;

/// 図書館アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LibraryApplicationError {
    /// 必須項目が空（エンティティ生成時のバリデーション）
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// 利用者が見つからない
    #[error("User not found")]
    UserNotFound,

    /// 貸出中の履歴が見つからない
    #[error("Loan history not found")]
    LoanHistoryNotFound,

    /// 書籍が既に貸出中
    #[error("Book is already on loan")]
    BookAlreadyLoaned,

    /// 貸出履歴の状態が不正
    #[error("Invalid loan state: {0}")]
    InvalidLoanState(String),

    /// UserRepositoryのエラー
    #[error("User repository error")]
    UserRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    BookRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LoanHistoryRepositoryのエラー
    #[error("Loan history repository error")]
    LoanHistoryRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryApplicationError>;
