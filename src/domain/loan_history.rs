use serde::{Deserialize, Serialize};

use super::{LoanHistoryId, ReturnBookError, UserId, UserLoanStatus, ValidationError};

/// 貸出履歴 - 1冊の書籍の1回の貸出
///
/// 書籍への参照は外部キーではなく書籍名（文字列）で保持する。
/// 書籍の削除や改名は過去の履歴に伝播しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoanHistory {
    pub id: LoanHistoryId,
    pub user_id: UserId,
    pub book_name: String,
    pub status: UserLoanStatus,
}

impl UserLoanHistory {
    pub fn from_parts(
        id: LoanHistoryId,
        user_id: UserId,
        book_name: String,
        status: UserLoanStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            book_name,
            status,
        }
    }

    /// 返却済みかどうか（レスポンスの`isReturn`に対応）
    pub fn is_return(&self) -> bool {
        self.status.is_returned()
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 状態は常にLOANEDで始まる
/// - 同じ書籍の二重貸出チェックは呼び出し側（アプリケーション層）の責務
///
/// 副作用なし。新しい貸出履歴を返す。
pub fn loan_book(
    user_id: UserId,
    book_name: impl Into<String>,
) -> Result<UserLoanHistory, ValidationError> {
    let book_name = book_name.into();
    if book_name.trim().is_empty() {
        return Err(ValidationError::BlankBookName);
    }

    Ok(UserLoanHistory {
        id: LoanHistoryId::new(),
        user_id,
        book_name,
        status: UserLoanStatus::Loaned,
    })
}

/// 純粋関数：書籍を返却する
///
/// LOANED -> RETURNED の一方向遷移。RETURNEDは終端状態。
pub fn return_book(history: &UserLoanHistory) -> Result<UserLoanHistory, ReturnBookError> {
    match history.status {
        UserLoanStatus::Loaned => Ok(UserLoanHistory {
            status: UserLoanStatus::Returned,
            ..history.clone()
        }),
        UserLoanStatus::Returned => Err(ReturnBookError::AlreadyReturned),
    }
}
