//! Books repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::{BookStore, LoanUpdate};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookForm, Page, PageRequest},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so the prefix matches literally
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM book WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_all(&self, request: Option<PageRequest>) -> AppResult<Page<Book>> {
        let Some(request) = request else {
            let books = sqlx::query_as::<_, Book>("SELECT * FROM book ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
            return Ok(Page::unpaged(books));
        };

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(&self.pool)
            .await?;

        let order_by = if request.sort_by_year { "year, id" } else { "id" };
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM book ORDER BY {} LIMIT $1 OFFSET $2",
            order_by
        ))
        .bind(request.size)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(books, total, &request))
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO book (title, author, year, date_taken, person_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(book.date_taken)
        .bind(book.person_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn update_details(&self, id: i32, form: &BookForm) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "UPDATE book SET title = $1, author = $2, year = $3 WHERE id = $4 RETURNING *",
        )
        .bind(&form.title)
        .bind(&form.author)
        .bind(form.year)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn lend_book(&self, book_id: i32, person_id: i32, taken_at: DateTime<Utc>) -> AppResult<LoanUpdate> {
        let mut tx = self.pool.begin().await?;

        // Row locks: the book against concurrent loans, the person against deletion
        let current: Option<Option<i32>> =
            sqlx::query_scalar("SELECT person_id FROM book WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous_borrower) = current else {
            return Ok(LoanUpdate::MissingBook);
        };

        let person: Option<i32> = sqlx::query_scalar("SELECT id FROM person WHERE id = $1 FOR KEY SHARE")
            .bind(person_id)
            .fetch_optional(&mut *tx)
            .await?;
        if person.is_none() {
            return Ok(LoanUpdate::MissingPerson);
        }

        let book = sqlx::query_as::<_, Book>(
            "UPDATE book SET person_id = $1, date_taken = $2 WHERE id = $3 RETURNING *",
        )
        .bind(person_id)
        .bind(taken_at)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(LoanUpdate::Lent {
            book,
            previous_borrower,
        })
    }

    async fn release_loan(&self, book_id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "UPDATE book SET person_id = NULL, date_taken = NULL WHERE id = $1 RETURNING *",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_by_title_starting_with_ignore_case(&self, prefix: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM book WHERE title ILIKE $1 ESCAPE '\\' ORDER BY id",
        )
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn find_by_person(&self, person_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM book WHERE person_id = $1 ORDER BY id")
            .bind(person_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_on_loan(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book WHERE person_id IS NOT NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_overdue(&self, cutoff: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book WHERE date_taken < $1")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
