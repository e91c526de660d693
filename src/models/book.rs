//! Book (catalog entry) model and its lending state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::person::Person;
use crate::error::{AppError, AppResult};

/// Book row. `person_id` and `date_taken` are either both set (on loan)
/// or both empty (available).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    #[serde(default)]
    pub id: Option<i32>,
    pub title: String,
    pub author: String,
    pub year: i32,
    #[serde(default)]
    pub date_taken: Option<DateTime<Utc>>,
    #[serde(default)]
    pub person_id: Option<i32>,
}

/// Lending state of a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Available,
    OnLoan {
        borrower_id: i32,
        taken_at: DateTime<Utc>,
    },
}

impl Book {
    /// New, unsaved and available book
    pub fn new(title: impl Into<String>, author: impl Into<String>, year: i32) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            year,
            date_taken: None,
            person_id: None,
        }
    }

    pub fn loan_state(&self) -> AppResult<LoanState> {
        match (self.person_id, self.date_taken) {
            (None, None) => Ok(LoanState::Available),
            (Some(borrower_id), Some(taken_at)) => Ok(LoanState::OnLoan {
                borrower_id,
                taken_at,
            }),
            (Some(borrower_id), None) => Err(AppError::InvariantViolation(format!(
                "book {:?} is lent to person {} without a date taken",
                self.id, borrower_id
            ))),
            (None, Some(_)) => Err(AppError::InvariantViolation(format!(
                "book {:?} has a date taken but no borrower",
                self.id
            ))),
        }
    }

    pub fn is_on_loan(&self) -> bool {
        self.person_id.is_some()
    }

    /// Move to `OnLoan`, overwriting any current borrower
    pub fn lend_to(&mut self, person_id: i32, taken_at: DateTime<Utc>) {
        self.person_id = Some(person_id);
        self.date_taken = Some(taken_at);
    }

    /// Move to `Available`
    pub fn release(&mut self) {
        self.person_id = None;
        self.date_taken = None;
    }

    /// Copy the editable fields of a form, leaving id and loan untouched
    pub fn apply(&mut self, form: BookForm) {
        self.title = form.title;
        self.author = form.author;
        self.year = form.year;
    }
}

/// Create/update book input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookForm {
    #[validate(length(min = 3, max = 200, message = "Name should be between 3 and 200"))]
    pub title: String,
    #[validate(length(min = 3, max = 400, message = "Author should be between 3 and 400"))]
    pub author: String,
    #[validate(range(min = 1900, message = "Year of publication should be greater than 1899"))]
    pub year: i32,
}

impl From<BookForm> for Book {
    fn from(form: BookForm) -> Self {
        Book::new(form.title, form.author, form.year)
    }
}

/// A book on loan, as seen from its borrower, with the derived overdue flag
#[derive(Debug, Clone, Serialize)]
pub struct LoanedBook {
    #[serde(flatten)]
    pub book: Book,
    pub taken_at: DateTime<Utc>,
    pub overdue: bool,
}

/// Book with its current borrower, if any
#[derive(Debug, Clone, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub borrower: Option<Person>,
}
