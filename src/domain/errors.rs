use thiserror::Error;

/// エンティティ生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 利用者名が空
    #[error("user name must not be blank")]
    BlankUserName,
    /// 書籍名が空
    #[error("book name must not be blank")]
    BlankBookName,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnBookError {
    /// 既に返却済み
    #[error("loan history is already returned")]
    AlreadyReturned,
}
