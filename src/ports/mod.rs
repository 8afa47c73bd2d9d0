pub mod book_repository;
pub mod loan_history_repository;
pub mod user_repository;

pub use book_repository::{BookRepository, BookTypeCount};
pub use loan_history_repository::{
    LoanHistoryRepository, LoanRecordOutcome, ReturnRecordOutcome,
};
pub use user_repository::{UserHistoryView, UserRepository};
