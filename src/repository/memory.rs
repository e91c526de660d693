//! In-process store with the same constraints as the PostgreSQL schema
//!
//! Every operation runs under a single lock acquisition, so checks and
//! writes are atomic the way the SQL transactions are. Constraint failures
//! are reported as `AppError::constraint` with the schema's constraint names.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BookStore, FullNameLookup, LoanUpdate, PersonStore};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookForm, Page, PageRequest, Person},
};

const LOAN_COMPLETE: &str = "book_loan_complete";
const BORROWER_FKEY: &str = "book_person_id_fkey";

#[derive(Default)]
struct Tables {
    books: BTreeMap<i32, Book>,
    people: BTreeMap<i32, Person>,
    last_book_id: i32,
    last_person_id: i32,
}

impl Tables {
    fn check_book(&self, book: &Book) -> AppResult<()> {
        if book.person_id.is_some() != book.date_taken.is_some() {
            return Err(AppError::constraint(LOAN_COMPLETE));
        }
        match book.person_id {
            Some(person_id) if !self.people.contains_key(&person_id) => {
                Err(AppError::constraint(BORROWER_FKEY))
            }
            _ => Ok(()),
        }
    }
}

/// Books and people kept in id order, which is the storage order
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn find_all(&self, request: Option<PageRequest>) -> AppResult<Page<Book>> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables.books.values().cloned().collect();

        let Some(request) = request else {
            return Ok(Page::unpaged(books));
        };

        if request.sort_by_year {
            books.sort_by_key(|b| b.year);
        }
        let total = books.len() as i64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.size).unwrap_or(usize::MAX);
        let items = books.into_iter().skip(skip).take(take).collect();
        Ok(Page::new(items, total, &request))
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        Ok(self.tables.read().await.books.contains_key(&id))
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        tables.check_book(book)?;

        tables.last_book_id += 1;
        let id = tables.last_book_id;
        let stored = Book {
            id: Some(id),
            ..book.clone()
        };
        tables.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        self.tables
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn update_details(&self, id: i32, form: &BookForm) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        Ok(tables.books.get_mut(&id).map(|book| {
            book.apply(form.clone());
            book.clone()
        }))
    }

    async fn lend_book(&self, book_id: i32, person_id: i32, taken_at: DateTime<Utc>) -> AppResult<LoanUpdate> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&book_id) {
            return Ok(LoanUpdate::MissingBook);
        }
        if !tables.people.contains_key(&person_id) {
            return Ok(LoanUpdate::MissingPerson);
        }
        let Some(book) = tables.books.get_mut(&book_id) else {
            return Ok(LoanUpdate::MissingBook);
        };
        let previous_borrower = book.person_id;
        book.lend_to(person_id, taken_at);
        Ok(LoanUpdate::Lent {
            book: book.clone(),
            previous_borrower,
        })
    }

    async fn release_loan(&self, book_id: i32) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        Ok(tables.books.get_mut(&book_id).map(|book| {
            book.release();
            book.clone()
        }))
    }

    async fn find_by_title_starting_with_ignore_case(&self, prefix: &str) -> AppResult<Vec<Book>> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .tables
            .read()
            .await
            .books
            .values()
            .filter(|b| b.title.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn find_by_person(&self, person_id: i32) -> AppResult<Vec<Book>> {
        Ok(self
            .tables
            .read()
            .await
            .books
            .values()
            .filter(|b| b.person_id == Some(person_id))
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }

    async fn count_on_loan(&self) -> AppResult<i64> {
        Ok(self
            .tables
            .read()
            .await
            .books
            .values()
            .filter(|b| b.is_on_loan())
            .count() as i64)
    }

    async fn count_overdue(&self, cutoff: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .tables
            .read()
            .await
            .books
            .values()
            .filter(|b| b.date_taken.is_some_and(|taken| taken < cutoff))
            .count() as i64)
    }
}

#[async_trait]
impl FullNameLookup for InMemoryStore {
    async fn find_by_full_name(&self, full_name: &str) -> AppResult<Option<Person>> {
        Ok(self
            .tables
            .read()
            .await
            .people
            .values()
            .find(|p| p.full_name == full_name)
            .cloned())
    }
}

#[async_trait]
impl PersonStore for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Person>> {
        Ok(self.tables.read().await.people.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Person>> {
        Ok(self.tables.read().await.people.values().cloned().collect())
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        Ok(self.tables.read().await.people.contains_key(&id))
    }

    async fn save(&self, person: &Person) -> AppResult<Person> {
        let mut tables = self.tables.write().await;
        let id = match person.id {
            Some(id) if tables.people.contains_key(&id) => id,
            Some(id) => return Err(AppError::NotFound(format!("Person with id {} not found", id))),
            None => {
                tables.last_person_id += 1;
                tables.last_person_id
            }
        };
        let stored = Person {
            id: Some(id),
            ..person.clone()
        };
        tables.people.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.people.contains_key(&id) {
            return Err(AppError::NotFound(format!("Person with id {} not found", id)));
        }
        if tables.books.values().any(|b| b.person_id == Some(id)) {
            return Err(AppError::constraint(BORROWER_FKEY));
        }
        tables.people.remove(&id);
        Ok(())
    }

    async fn delete_releasing_books(&self, id: i32) -> AppResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        if tables.people.remove(&id).is_none() {
            return Ok(None);
        }
        let mut released = 0;
        for book in tables.books.values_mut().filter(|b| b.person_id == Some(id)) {
            book.release();
            released += 1;
        }
        Ok(Some(released))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.people.len() as i64)
    }
}
