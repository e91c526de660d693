//! Loan management service
//!
//! A book is either available or on loan to exactly one person. Assigning
//! an already lent book moves it to the new borrower with a fresh date taken;
//! releasing an available book succeeds without changes.

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{Book, LoanState, LoanedBook},
    repository::{LoanUpdate, Repository},
};

/// True when a loan taken at `taken_at` is older than `period` at `now`
pub fn is_overdue(taken_at: DateTime<Utc>, now: DateTime<Utc>, period: Duration) -> bool {
    taken_at < now - period
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    pub fn overdue_period(&self) -> Duration {
        Duration::days(self.config.overdue_after_days)
    }

    /// Lend a book to a person, starting the loan now
    pub async fn assign(&self, book_id: i32, person_id: i32) -> AppResult<Book> {
        match self.repository.books.lend_book(book_id, person_id, Utc::now()).await? {
            LoanUpdate::Lent {
                book,
                previous_borrower,
            } => {
                if let Some(previous) = previous_borrower.filter(|&p| p != person_id) {
                    tracing::info!(
                        "Lending: book id={} moves from person id={} to person id={}",
                        book_id, previous, person_id
                    );
                }
                tracing::info!("Lending: book id={} lent to person id={}", book_id, person_id);
                Ok(book)
            }
            LoanUpdate::MissingBook => {
                tracing::warn!("Lending: assign of missing book id={}", book_id);
                Err(AppError::InvalidOperation(format!("Book with id {} does not exist", book_id)))
            }
            LoanUpdate::MissingPerson => {
                tracing::warn!("Lending: assign of book id={} to missing person id={}", book_id, person_id);
                Err(AppError::InvalidOperation(format!(
                    "Person with id {} does not exist",
                    person_id
                )))
            }
        }
    }

    /// Return a book to the shelf. Releasing an available book changes nothing.
    pub async fn release(&self, book_id: i32) -> AppResult<Book> {
        let Some(book) = self.repository.books.release_loan(book_id).await? else {
            tracing::warn!("Lending: release of missing book id={}", book_id);
            return Err(AppError::InvalidOperation(format!("Book with id {} does not exist", book_id)));
        };
        tracing::info!("Lending: book id={} released", book_id);
        Ok(book)
    }

    /// Books currently lent to a person, flagged when overdue.
    /// An unknown person has no loans.
    pub async fn loans_of(&self, person_id: i32) -> AppResult<Vec<LoanedBook>> {
        if !self.repository.people.exists_by_id(person_id).await? {
            return Ok(Vec::new());
        }
        let books = self.repository.books.find_by_person(person_id).await?;
        let now = Utc::now();
        books
            .into_iter()
            .map(|book| self.to_loan(book, now))
            .collect()
    }

    /// Number of loans past the overdue period, across all borrowers
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let cutoff = Utc::now() - self.overdue_period();
        self.repository.books.count_overdue(cutoff).await
    }

    fn to_loan(&self, book: Book, now: DateTime<Utc>) -> AppResult<LoanedBook> {
        match book.loan_state() {
            Ok(LoanState::OnLoan { taken_at, .. }) => Ok(LoanedBook {
                overdue: is_overdue(taken_at, now, self.overdue_period()),
                taken_at,
                book,
            }),
            Ok(LoanState::Available) => Err(AppError::InvariantViolation(format!(
                "book {:?} listed as a loan but has no borrower",
                book.id
            ))),
            Err(e) => {
                tracing::error!("Lending: {}", e);
                Err(e)
            }
        }
    }
}
