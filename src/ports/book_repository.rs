use crate::domain::{Book, BookType};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 分野ごとの蔵書数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookTypeCount {
    pub book_type: BookType,
    pub count: i64,
}

/// 書籍リポジトリポート
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn save(&self, book: &Book) -> Result<()>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Book>>;

    async fn find_all(&self) -> Result<Vec<Book>>;

    /// 分野ごとの蔵書数を集計する（GROUP BY）
    ///
    /// 0冊の分野は結果に含まれない。
    async fn count_by_type(&self) -> Result<Vec<BookTypeCount>>;

    /// 全件削除（環境リセット用）
    async fn delete_all(&self) -> Result<()>;
}
