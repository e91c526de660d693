//! Repository layer: the storage operations the services rely on

pub mod books;
pub mod memory;
pub mod people;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, BookForm, Page, PageRequest, Person},
};

pub use books::BooksRepository;
pub use memory::InMemoryStore;
pub use people::PeopleRepository;

/// Outcome of lending a book to a person
#[derive(Debug, Clone, PartialEq)]
pub enum LoanUpdate {
    Lent {
        book: Book,
        previous_borrower: Option<i32>,
    },
    MissingBook,
    MissingPerson,
}

/// Book storage.
///
/// `update_details`, `lend_book` and `release_loan` are atomic: each checks
/// and writes in one step, and never rewrites columns it does not own.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    /// `None` returns the whole collection in storage order
    async fn find_all(&self, request: Option<PageRequest>) -> AppResult<Page<Book>>;

    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;

    /// Insert a new row; any `id` on the input is ignored
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    async fn delete_by_id(&self, id: i32) -> AppResult<()>;

    /// Replace title, author and year only. `None` when the book does not exist.
    async fn update_details(&self, id: i32, form: &BookForm) -> AppResult<Option<Book>>;

    /// Lend a book to an existing person, replacing any current loan
    async fn lend_book(&self, book_id: i32, person_id: i32, taken_at: DateTime<Utc>) -> AppResult<LoanUpdate>;

    /// Clear the loan of a book. `None` when the book does not exist.
    async fn release_loan(&self, book_id: i32) -> AppResult<Option<Book>>;

    async fn find_by_title_starting_with_ignore_case(&self, prefix: &str) -> AppResult<Vec<Book>>;

    /// Books currently lent to a person
    async fn find_by_person(&self, person_id: i32) -> AppResult<Vec<Book>>;

    async fn count(&self) -> AppResult<i64>;

    async fn count_on_loan(&self) -> AppResult<i64>;

    /// Loans taken strictly before `cutoff`
    async fn count_overdue(&self, cutoff: DateTime<Utc>) -> AppResult<i64>;
}

/// Lookup of a person by exact full name
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FullNameLookup: Send + Sync {
    async fn find_by_full_name(&self, full_name: &str) -> AppResult<Option<Person>>;
}

/// Person storage
#[async_trait]
pub trait PersonStore: FullNameLookup {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Person>>;

    async fn find_all(&self) -> AppResult<Vec<Person>>;

    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;

    /// Insert when `id` is empty, otherwise update the row with that id
    async fn save(&self, person: &Person) -> AppResult<Person>;

    async fn delete_by_id(&self, id: i32) -> AppResult<()>;

    /// Release every book the person holds, then delete them, as one unit.
    /// Returns the number of books released, `None` when the person does not exist.
    async fn delete_releasing_books(&self, id: i32) -> AppResult<Option<u64>>;

    async fn count(&self) -> AppResult<i64>;
}

/// Storage handles shared by all services
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub people: Arc<dyn PersonStore>,
}

impl Repository {
    pub fn new(books: Arc<dyn BookStore>, people: Arc<dyn PersonStore>) -> Self {
        Self { books, people }
    }

    /// PostgreSQL-backed repository
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(BooksRepository::new(pool.clone())),
            people: Arc::new(PeopleRepository::new(pool)),
        }
    }

    /// Process-local repository, empty on creation
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self {
            books: store.clone(),
            people: store,
        }
    }
}
