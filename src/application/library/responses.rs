use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Book, BookType, User, UserLoanHistory};
use crate::ports::{BookTypeCount, UserHistoryView};

/// 利用者レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub age: Option<i32>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            name: user.name,
            age: user.age,
        }
    }
}

/// 利用者ごとの貸出履歴レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoanHistoryResponse {
    pub name: String,
    pub books: Vec<BookHistoryResponse>,
}

impl From<UserHistoryView> for UserLoanHistoryResponse {
    fn from(view: UserHistoryView) -> Self {
        Self {
            name: view.user.name,
            books: view
                .histories
                .into_iter()
                .map(BookHistoryResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookHistoryResponse {
    pub name: String,
    pub is_return: bool,
}

impl From<UserLoanHistory> for BookHistoryResponse {
    fn from(history: UserLoanHistory) -> Self {
        let is_return = history.is_return();
        Self {
            name: history.book_name,
            is_return,
        }
    }
}

/// 書籍レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub book_type: BookType,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            name: book.name,
            book_type: book.book_type,
        }
    }
}

/// 分野別蔵書数レスポンス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStatResponse {
    #[serde(rename = "type")]
    pub book_type: BookType,
    pub count: i64,
}

impl From<BookTypeCount> for BookStatResponse {
    fn from(stat: BookTypeCount) -> Self {
        Self {
            book_type: stat.book_type,
            count: stat.count,
        }
    }
}
