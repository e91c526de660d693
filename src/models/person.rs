//! Person (borrower) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::book::LoanedBook;

/// Person row. The books a person holds are not stored here; they are
/// queried from the book table on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Person {
    #[serde(default)]
    pub id: Option<i32>,
    pub full_name: String,
    pub year_of_birth: i32,
}

impl Person {
    pub fn new(full_name: impl Into<String>, year_of_birth: i32) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            year_of_birth,
        }
    }
}

/// Create/update person input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PersonForm {
    #[validate(length(min = 3, max = 100, message = "Name should be between 3 and 100"))]
    pub full_name: String,
    #[validate(range(min = 1900, message = "Year of birth should be greater than 1899"))]
    pub year_of_birth: i32,
}

impl PersonForm {
    pub fn new(full_name: impl Into<String>, year_of_birth: i32) -> Self {
        Self {
            full_name: full_name.into(),
            year_of_birth,
        }
    }

    pub fn into_person(self, id: Option<i32>) -> Person {
        Person {
            id,
            full_name: self.full_name,
            year_of_birth: self.year_of_birth,
        }
    }
}

/// Person with the books currently lent to them
#[derive(Debug, Clone, Serialize)]
pub struct PersonDetails {
    #[serde(flatten)]
    pub person: Person,
    pub books: Vec<LoanedBook>,
}

impl PersonDetails {
    pub fn new(person: Person) -> Self {
        Self {
            person,
            books: Vec::new(),
        }
    }

    pub fn add_loan(&mut self, loan: LoanedBook) {
        self.books.push(loan);
    }

    pub fn overdue_count(&self) -> usize {
        self.books.iter().filter(|b| b.overdue).count()
    }
}
