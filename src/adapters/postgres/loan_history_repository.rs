use crate::domain::{LoanHistoryId, UserId, UserLoanHistory, UserLoanStatus};
use crate::ports::loan_history_repository::{
    LoanHistoryRepository as LoanHistoryRepositoryTrait, LoanRecordOutcome, Result,
    ReturnRecordOutcome,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

fn map_row_to_history(row: &PgRow) -> Result<UserLoanHistory> {
    let status_str: &str = row.get("status");
    let status = UserLoanStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(UserLoanHistory::from_parts(
        LoanHistoryId::from_uuid(row.get("id")),
        UserId::from_uuid(row.get("user_id")),
        row.get("book_name"),
        status,
    ))
}

/// PostgreSQL implementation of LoanHistoryRepository
///
/// The partial unique index on `book_name WHERE status = 'LOANED'` makes
/// `record_loan` safe against concurrent loans of the same book.
/// `record_return` only updates rows still in LOANED.
pub struct LoanHistoryRepository {
    pool: PgPool,
}

impl LoanHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanHistoryRepositoryTrait for LoanHistoryRepository {
    async fn record_loan(&self, history: &UserLoanHistory) -> Result<LoanRecordOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_loan_history (id, user_id, book_name, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (book_name) WHERE status = 'LOANED'
            DO NOTHING
            "#,
        )
        .bind(history.id.value())
        .bind(history.user_id.value())
        .bind(&history.book_name)
        .bind(history.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(LoanRecordOutcome::BookAlreadyLoaned);
        }
        Ok(LoanRecordOutcome::Recorded)
    }

    async fn exists_by_book_name_and_status(
        &self,
        book_name: &str,
        status: UserLoanStatus,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_loan_history WHERE book_name = $1 AND status = $2)",
        )
        .bind(book_name)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_by_user_and_book_name(
        &self,
        user_id: UserId,
        book_name: &str,
        status: UserLoanStatus,
    ) -> Result<Option<UserLoanHistory>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_name, status
            FROM user_loan_history
            WHERE user_id = $1 AND book_name = $2 AND status = $3
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id.value())
        .bind(book_name)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_history).transpose()
    }

    async fn record_return(&self, history: &UserLoanHistory) -> Result<ReturnRecordOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE user_loan_history
            SET status = $2
            WHERE id = $1 AND status = 'LOANED'
            "#,
        )
        .bind(history.id.value())
        .bind(history.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(ReturnRecordOutcome::NotOnLoan);
        }
        Ok(ReturnRecordOutcome::Returned)
    }

    async fn count_by_status(&self, status: UserLoanStatus) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_loan_history WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn find_all(&self) -> Result<Vec<UserLoanHistory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_name, status
            FROM user_loan_history
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_history).collect()
    }

    async fn delete_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM user_loan_history")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
