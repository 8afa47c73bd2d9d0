use crate::domain::{Book, BookId, BookType};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, BookTypeCount, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let type_str: &str = row.get("type");
    let book_type = BookType::from_str(type_str).map_err(invalid_data)?;

    Ok(Book::from_parts(
        BookId::from_uuid(row.get("id")),
        row.get("name"),
        book_type,
    ))
}

/// PostgreSQL implementation of BookRepository
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn save(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, name, type)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                type = EXCLUDED.type
            "#,
        )
        .bind(book.id.value())
        .bind(&book.name)
        .bind(book.book_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, type
            FROM books
            WHERE name = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query("SELECT id, name, type FROM books ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn count_by_type(&self) -> Result<Vec<BookTypeCount>> {
        let rows = sqlx::query(
            r#"
            SELECT type, COUNT(*) AS count
            FROM books
            GROUP BY type
            ORDER BY type ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<BookTypeCount> {
                let type_str: &str = row.get("type");
                Ok(BookTypeCount {
                    book_type: BookType::from_str(type_str).map_err(invalid_data)?,
                    count: row.get("count"),
                })
            })
            .collect()
    }

    async fn delete_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM books").execute(&self.pool).await?;
        Ok(())
    }
}
