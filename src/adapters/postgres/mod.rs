pub mod book_repository;
pub mod loan_history_repository;
pub mod user_repository;

pub use book_repository::BookRepository as PostgresBookRepository;
pub use loan_history_repository::LoanHistoryRepository as PostgresLoanHistoryRepository;
pub use user_repository::UserRepository as PostgresUserRepository;

/// 行データの変換失敗をポートのエラー型に変換する
pub(crate) fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}
