//! Borrower name uniqueness check

use std::sync::Arc;

pub use crate::error::DUPLICATE_NAME;

use crate::{
    error::{AppResult, FieldError},
    models::PersonForm,
    repository::FullNameLookup,
};

/// Rejects a full name already held by another person.
///
/// `id` is the person being edited, `None` when creating. A person keeping
/// their own name on update does not collide with themselves.
pub struct BorrowerIdentityValidator<L: FullNameLookup + ?Sized> {
    lookup: Arc<L>,
}

impl<L: FullNameLookup + ?Sized> Clone for BorrowerIdentityValidator<L> {
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<L: FullNameLookup + ?Sized> BorrowerIdentityValidator<L> {
    pub fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    pub async fn validate(&self, candidate: &PersonForm, id: Option<i32>) -> AppResult<Vec<FieldError>> {
        let existing = self.lookup.find_by_full_name(&candidate.full_name).await?;
        match existing {
            Some(other) if other.id != id => {
                tracing::debug!(
                    "Identity: \"{}\" already held by person id={:?}",
                    candidate.full_name, other.id
                );
                Ok(vec![FieldError::new("full_name", DUPLICATE_NAME)])
            }
            _ => Ok(Vec::new()),
        }
    }
}
