use crate::domain::{UserId, UserLoanHistory, UserLoanStatus};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出記録の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanRecordOutcome {
    /// 新しい貸出履歴を保存した
    Recorded,
    /// 同じ書籍名のLOANED履歴が既に存在したため保存しなかった
    BookAlreadyLoaned,
}

/// 返却記録の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnRecordOutcome {
    /// LOANEDの履歴を返却済みに更新した
    Returned,
    /// 該当する履歴がない、または既にLOANEDではなかった
    NotOnLoan,
}

/// 貸出履歴リポジトリポート
#[async_trait]
pub trait LoanHistoryRepository: Send + Sync {
    /// LOANED状態の貸出履歴を記録する
    ///
    /// 同じ書籍名のLOANED履歴が存在する場合は保存せずに
    /// `LoanRecordOutcome::BookAlreadyLoaned`を返す。
    /// 存在確認と保存は不可分に行われる（同時実行でも二重貸出にならない）。
    async fn record_loan(&self, history: &UserLoanHistory) -> Result<LoanRecordOutcome>;

    /// 書籍名とステータスで履歴の存在を確認する
    async fn exists_by_book_name_and_status(
        &self,
        book_name: &str,
        status: UserLoanStatus,
    ) -> Result<bool>;

    /// 利用者・書籍名・ステータスで履歴を1件取得する
    async fn find_by_user_and_book_name(
        &self,
        user_id: UserId,
        book_name: &str,
        status: UserLoanStatus,
    ) -> Result<Option<UserLoanHistory>>;

    /// 返却済みの履歴を記録する
    ///
    /// 保存済みの同じIDの履歴がLOANEDの場合のみステータスを更新する。
    /// 確認と更新は不可分に行われ、同じ貸出の二重返却は
    /// `ReturnRecordOutcome::NotOnLoan`になる。
    async fn record_return(&self, history: &UserLoanHistory) -> Result<ReturnRecordOutcome>;

    /// ステータスごとの件数
    async fn count_by_status(&self, status: UserLoanStatus) -> Result<i64>;

    async fn find_all(&self) -> Result<Vec<UserLoanHistory>>;

    /// 全件削除（環境リセット用）
    async fn delete_all(&self) -> Result<()>;
}
