//! Catalog listing, search and book CRUD on the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lending_library::{
    config::LendingConfig,
    models::{Book, BookForm, BookListQuery, Page, PageRequest, PersonForm},
    repository::{BookStore, InMemoryStore, LoanUpdate},
    AppError, AppResult, Repository, Services,
};
use tokio_test::{assert_err, assert_ok};

fn services() -> Services {
    Services::new(Repository::in_memory(), LendingConfig::default())
}

fn form(title: &str, year: i32) -> BookForm {
    BookForm {
        title: title.to_string(),
        author: "Some Author".to_string(),
        year,
    }
}

/// 12 books whose years alternate above and below 2000
async fn seed_twelve(services: &Services) {
    for i in 0..12 {
        let year = if i % 2 == 0 { 2000 + i } else { 2000 - i };
        assert_ok!(services.catalog.create_book(form(&format!("Book {:02}", i), year)).await);
    }
}

#[tokio::test]
async fn test_unpaged_listing_returns_everything_in_storage_order() {
    let services = services();
    seed_twelve(&services).await;

    let page = services.catalog.list_books(&BookListQuery::default()).await.unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.items.len(), 12);
    assert_eq!(page.total_pages, 1);
    let ids: Vec<_> = page.items.iter().map(|b| b.id.unwrap()).collect();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_second_page_sorted_by_year() {
    let services = services();
    seed_twelve(&services).await;

    let mut years: Vec<i32> = services
        .catalog
        .list_books(&BookListQuery::default())
        .await
        .unwrap()
        .items
        .iter()
        .map(|b| b.year)
        .collect();
    years.sort();

    let page = services
        .catalog
        .list_books(&BookListQuery::page(1, 5, true))
        .await
        .unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 5);
    let page_years: Vec<i32> = page.items.iter().map(|b| b.year).collect();
    assert_eq!(page_years, years[5..10].to_vec());
}

#[tokio::test]
async fn test_missing_page_parameters_use_defaults() {
    let services = services();
    seed_twelve(&services).await;

    let query = BookListQuery {
        sort_by_year: Some(false),
        ..Default::default()
    };
    let page = services.catalog.list_books(&query).await.unwrap();
    assert_eq!(page.page, 0);
    assert_eq!(page.per_page, 10);
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total_pages, 2);

    let last = services
        .catalog
        .list_books(&BookListQuery {
            page: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 2);
    assert!(!last.has_next());
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let services = services();
    seed_twelve(&services).await;

    let page = services
        .catalog
        .list_books(&BookListQuery::page(5, 5, false))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 12);
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_huge_paging_values() {
    let services = services();
    seed_twelve(&services).await;

    let everything = services
        .catalog
        .list_books(&BookListQuery::page(0, i64::MAX, true))
        .await
        .unwrap();
    assert_eq!(everything.items.len(), 12);
    assert_eq!(everything.total_pages, 1);

    let nowhere = services
        .catalog
        .list_books(&BookListQuery::page(i64::MAX, i64::MAX, false))
        .await
        .unwrap();
    assert!(nowhere.items.is_empty());
    assert_eq!(nowhere.total_pages, 1);
}

#[tokio::test]
async fn test_prefix_search_is_case_insensitive_and_anchored() {
    let services = services();
    assert_ok!(services.catalog.create_book(form("Dune Messiah", 1969)).await);
    assert_ok!(services.catalog.create_book(form("The Dune Trilogy", 1979)).await);
    assert_ok!(services.catalog.create_book(form("DUNE", 1965)).await);

    let found = services.catalog.search_by_title_prefix("dune").await.unwrap();
    let titles: Vec<_> = found.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["Dune Messiah", "DUNE"]);

    assert!(services.catalog.search_by_title_prefix("xyz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_search_is_rejected() {
    let services = services();
    assert_ok!(services.catalog.create_book(form("Dune Messiah", 1969)).await);
    let err = assert_err!(services.catalog.search_by_title_prefix("").await);
    assert!(matches!(err, AppError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let services = services();
    let err = assert_err!(
        services
            .catalog
            .create_book(BookForm {
                title: "Du".to_string(),
                author: "Frank Herbert".to_string(),
                year: 1850,
            })
            .await
    );
    let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["title", "year"]);
    assert_eq!(services.catalog.catalog_summary().await.unwrap().books, 0);
}

#[tokio::test]
async fn test_update_and_delete() {
    let services = services();
    let book = services.catalog.create_book(form("Dune", 1965)).await.unwrap();
    let id = book.id.unwrap();

    let updated = services.catalog.update_book(id, form("Dune Messiah", 1969)).await.unwrap();
    assert_eq!(updated.id, Some(id));
    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(services.catalog.find_book(id).await.unwrap(), updated);

    let err = assert_err!(services.catalog.update_book(999, form("Dune", 1965)).await);
    assert!(matches!(err, AppError::InvalidOperation(_)));

    assert_ok!(services.catalog.delete_book(id).await);
    assert!(matches!(services.catalog.find_book(id).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        services.catalog.delete_book(id).await,
        Err(AppError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn test_update_keeps_book_on_loan() {
    let services = services();
    let book = services.catalog.create_book(form("Dune", 1965)).await.unwrap();
    let id = book.id.unwrap();
    let person = services
        .people
        .create_person(PersonForm::new("Alice Smith", 1990))
        .await
        .unwrap();
    let lent = services.lending.assign(id, person.id.unwrap()).await.unwrap();

    let updated = services.catalog.update_book(id, form("Dune (2nd ed.)", 1966)).await.unwrap();
    assert_eq!(updated.person_id, lent.person_id);
    assert_eq!(updated.date_taken, lent.date_taken);

    let details = services.catalog.get_book_details(id).await.unwrap();
    assert_eq!(details.borrower.map(|p| p.full_name), Some("Alice Smith".to_string()));
}

/// Book store that lends the book to `borrower` right before every details
/// update reaches storage, as a concurrent assign would
struct LendsDuringEdit {
    inner: Arc<InMemoryStore>,
    borrower: i32,
}

#[async_trait]
impl BookStore for LendsDuringEdit {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        BookStore::find_by_id(&*self.inner, id).await
    }

    async fn find_all(&self, request: Option<PageRequest>) -> AppResult<Page<Book>> {
        BookStore::find_all(&*self.inner, request).await
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        BookStore::exists_by_id(&*self.inner, id).await
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        self.inner.insert(book).await
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        BookStore::delete_by_id(&*self.inner, id).await
    }

    async fn update_details(&self, id: i32, form: &BookForm) -> AppResult<Option<Book>> {
        self.inner.lend_book(id, self.borrower, Utc::now()).await?;
        self.inner.update_details(id, form).await
    }

    async fn lend_book(&self, book_id: i32, person_id: i32, taken_at: DateTime<Utc>) -> AppResult<LoanUpdate> {
        self.inner.lend_book(book_id, person_id, taken_at).await
    }

    async fn release_loan(&self, book_id: i32) -> AppResult<Option<Book>> {
        self.inner.release_loan(book_id).await
    }

    async fn find_by_title_starting_with_ignore_case(&self, prefix: &str) -> AppResult<Vec<Book>> {
        self.inner.find_by_title_starting_with_ignore_case(prefix).await
    }

    async fn find_by_person(&self, person_id: i32) -> AppResult<Vec<Book>> {
        self.inner.find_by_person(person_id).await
    }

    async fn count(&self) -> AppResult<i64> {
        BookStore::count(&*self.inner).await
    }

    async fn count_on_loan(&self) -> AppResult<i64> {
        self.inner.count_on_loan().await
    }

    async fn count_overdue(&self, cutoff: DateTime<Utc>) -> AppResult<i64> {
        self.inner.count_overdue(cutoff).await
    }
}

#[tokio::test]
async fn test_update_does_not_undo_concurrent_assign() {
    let store = Arc::new(InMemoryStore::new());
    let setup = Services::new(Repository::new(store.clone(), store.clone()), LendingConfig::default());
    let id = setup.catalog.create_book(form("Dune", 1965)).await.unwrap().id.unwrap();
    let alice = setup
        .people
        .create_person(PersonForm::new("Alice Smith", 1990))
        .await
        .unwrap()
        .id
        .unwrap();

    let books = Arc::new(LendsDuringEdit {
        inner: store.clone(),
        borrower: alice,
    });
    let services = Services::new(Repository::new(books, store.clone()), LendingConfig::default());

    let updated = services.catalog.update_book(id, form("Dune (2nd ed.)", 1966)).await.unwrap();
    assert_eq!(updated.title, "Dune (2nd ed.)");
    assert_eq!(updated.person_id, Some(alice));
    assert!(updated.date_taken.is_some());

    let loans = services.lending.loans_of(alice).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].book.title, "Dune (2nd ed.)");
}
