use crate::domain::{User, UserId, UserLoanHistory};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者と貸出履歴を結合したビュー
///
/// 全利用者＋貸出履歴の一覧クエリ専用。遅延ロードには頼らず、
/// このクエリ経路でのみ関連を明示的に解決する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHistoryView {
    pub user: User,
    pub histories: Vec<UserLoanHistory>,
}

/// 利用者リポジトリポート
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 利用者を保存する
    ///
    /// 新規の場合はINSERT、既存の場合はUPDATE（upsert）。
    async fn save(&self, user: &User) -> Result<()>;

    /// IDで利用者を取得する
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// 名前の完全一致で利用者を取得する
    ///
    /// 名前は一意ではないため、複数ある場合は最初の1件を返す。
    async fn find_by_name(&self, name: &str) -> Result<Option<User>>;

    /// 全利用者を取得する
    async fn find_all(&self) -> Result<Vec<User>>;

    /// 利用者を削除する
    ///
    /// 利用者が所有する貸出履歴も合わせて削除される。
    async fn delete(&self, id: UserId) -> Result<()>;

    /// 全利用者を貸出履歴と共に取得する（LEFT JOIN）
    ///
    /// 貸出履歴のない利用者も空のリストで含まれる。
    async fn find_all_with_histories(&self) -> Result<Vec<UserHistoryView>>;

    /// 全件削除（環境リセット用）
    async fn delete_all(&self) -> Result<()>;
}
