//! Data models for the lending library

pub mod book;
pub mod page;
pub mod person;

// Re-export commonly used types
pub use book::{Book, BookDetails, BookForm, LoanState, LoanedBook};
pub use page::{BookListQuery, Page, PageRequest};
pub use person::{Person, PersonDetails, PersonForm};
