//! Catalog management service

use serde::Serialize;
use validator::Validate;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{Book, BookDetails, BookForm, BookListQuery, Page},
    repository::Repository,
};

/// Catalog counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub books: i64,
    pub on_loan: i64,
    pub available: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: LendingConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// List books. With no paging parameters at all the whole catalog is
    /// returned on one page; otherwise page 0 and the configured page size
    /// fill in whatever is missing.
    pub async fn list_books(&self, query: &BookListQuery) -> AppResult<Page<Book>> {
        let request = query.to_request(self.config.default_page_size)?;
        self.repository.books.find_all(request).await
    }

    /// Books whose title starts with `text`, ignoring case
    pub async fn search_by_title_prefix(&self, text: &str) -> AppResult<Vec<Book>> {
        if text.is_empty() {
            return Err(AppError::InvalidOperation(
                "Search text must not be empty".to_string(),
            ));
        }
        self.repository
            .books
            .find_by_title_starting_with_ignore_case(text)
            .await
    }

    pub async fn find_book(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Book together with the person holding it
    pub async fn get_book_details(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.find_book(id).await?;
        let borrower = match book.person_id {
            Some(person_id) => self.repository.people.find_by_id(person_id).await?,
            None => None,
        };
        Ok(BookDetails { book, borrower })
    }

    pub async fn create_book(&self, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        let book = self.repository.books.insert(&Book::from(form)).await?;
        tracing::info!("Catalog: created book id={:?} \"{}\"", book.id, book.title);
        Ok(book)
    }

    /// Replace title, author and year. A book on loan stays on loan.
    pub async fn update_book(&self, id: i32, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        let Some(book) = self.repository.books.update_details(id, &form).await? else {
            tracing::warn!("Catalog: update of missing book id={}", id);
            return Err(AppError::InvalidOperation(format!("Book with id {} does not exist", id)));
        };
        tracing::info!("Catalog: updated book id={}", id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        if !self.repository.books.exists_by_id(id).await? {
            tracing::warn!("Catalog: delete of missing book id={}", id);
            return Err(AppError::InvalidOperation(format!("Book with id {} does not exist", id)));
        }
        self.repository.books.delete_by_id(id).await?;
        tracing::info!("Catalog: deleted book id={}", id);
        Ok(())
    }

    pub async fn catalog_summary(&self) -> AppResult<CatalogSummary> {
        let books = self.repository.books.count().await?;
        let on_loan = self.repository.books.count_on_loan().await?;
        Ok(CatalogSummary {
            books,
            on_loan,
            available: books - on_loan,
        })
    }
}
