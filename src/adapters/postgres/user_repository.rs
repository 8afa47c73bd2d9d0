use crate::domain::{LoanHistoryId, User, UserId, UserLoanHistory, UserLoanStatus};
use crate::ports::user_repository::{
    Result, UserHistoryView, UserRepository as UserRepositoryTrait,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;
use uuid::Uuid;

use super::invalid_data;

fn map_row_to_user(row: &PgRow) -> User {
    User::from_parts(
        UserId::from_uuid(row.get("id")),
        row.get("name"),
        row.get("age"),
    )
}

/// PostgreSQL implementation of UserRepository
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn save(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, age)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                age = EXCLUDED.age
            "#,
        )
        .bind(user.id.value())
        .bind(&user.name)
        .bind(user.age)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, age FROM users WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(map_row_to_user))
    }

    /// Names are not unique; the earliest registered user wins
    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, age
            FROM users
            WHERE name = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_user))
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, age FROM users ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(map_row_to_user).collect())
    }

    /// Loan histories go with the user through ON DELETE CASCADE
    async fn delete(&self, id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Eagerly joins every user with its loan histories
    ///
    /// LEFT JOIN keeps users without histories. Rows arrive grouped by user,
    /// so consecutive rows are folded into one view.
    async fn find_all_with_histories(&self) -> Result<Vec<UserHistoryView>> {
        let mut rows = sqlx::query(
            r#"
            SELECT
                u.id AS user_id,
                u.name AS user_name,
                u.age AS user_age,
                h.id AS history_id,
                h.book_name,
                h.status
            FROM users u
            LEFT JOIN user_loan_history h ON h.user_id = u.id
            ORDER BY u.created_at ASC, u.id ASC, h.created_at ASC, h.id ASC
            "#,
        )
        .fetch(&self.pool);

        let mut views: Vec<UserHistoryView> = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let user_id = UserId::from_uuid(row.get("user_id"));

            let is_same_user = views.last().is_some_and(|v| v.user.id == user_id);
            if !is_same_user {
                views.push(UserHistoryView {
                    user: User::from_parts(user_id, row.get("user_name"), row.get("user_age")),
                    histories: Vec::new(),
                });
            }

            let history_id: Option<Uuid> = row.get("history_id");
            if let (Some(history_id), Some(view)) = (history_id, views.last_mut()) {
                let status_str: &str = row.get("status");
                let status = UserLoanStatus::from_str(status_str).map_err(invalid_data)?;
                view.histories.push(UserLoanHistory::from_parts(
                    LoanHistoryId::from_uuid(history_id),
                    user_id,
                    row.get("book_name"),
                    status,
                ));
            }
        }

        Ok(views)
    }

    async fn delete_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}
