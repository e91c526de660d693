//! Borrower management service

use validator::Validate;

use super::{identity::BorrowerIdentityValidator, lending::LendingService};
use crate::{
    error::{field_errors, AppError, AppResult, FieldError},
    models::{Person, PersonDetails, PersonForm},
    repository::{PersonStore, Repository},
};

#[derive(Clone)]
pub struct PeopleService {
    repository: Repository,
    identity: BorrowerIdentityValidator<dyn PersonStore>,
    lending: LendingService,
}

impl PeopleService {
    pub fn new(repository: Repository, lending: LendingService) -> Self {
        Self {
            identity: BorrowerIdentityValidator::new(repository.people.clone()),
            repository,
            lending,
        }
    }

    pub async fn list_people(&self) -> AppResult<Vec<Person>> {
        self.repository.people.find_all().await
    }

    pub async fn find_person(&self, id: i32) -> AppResult<Person> {
        self.repository
            .people
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Person with id {} not found", id)))
    }

    /// Person with the books they currently hold
    pub async fn get_person_details(&self, id: i32) -> AppResult<PersonDetails> {
        let person = self.find_person(id).await?;
        let mut details = PersonDetails::new(person);
        for loan in self.lending.loans_of(id).await? {
            details.add_loan(loan);
        }
        Ok(details)
    }

    /// Field constraints and name uniqueness, reported together.
    /// `id` is the person being edited, `None` when creating.
    pub async fn validate_person(&self, form: &PersonForm, id: Option<i32>) -> AppResult<Vec<FieldError>> {
        let mut errors = match form.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };
        errors.extend(self.identity.validate(form, id).await?);
        Ok(errors)
    }

    pub async fn create_person(&self, form: PersonForm) -> AppResult<Person> {
        let errors = self.validate_person(&form, None).await?;
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let person = self.repository.people.save(&form.into_person(None)).await?;
        tracing::info!("People: created person id={:?}", person.id);
        Ok(person)
    }

    pub async fn update_person(&self, id: i32, form: PersonForm) -> AppResult<Person> {
        let errors = self.validate_person(&form, Some(id)).await?;
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        if !self.repository.people.exists_by_id(id).await? {
            tracing::warn!("People: update of missing person id={}", id);
            return Err(AppError::InvalidOperation(format!("Person with id {} does not exist", id)));
        }
        self.repository.people.save(&form.into_person(Some(id))).await
    }

    /// Delete a person, returning every book they still hold in the same step
    pub async fn delete_person(&self, id: i32) -> AppResult<()> {
        let Some(released) = self.repository.people.delete_releasing_books(id).await? else {
            tracing::warn!("People: delete of missing person id={}", id);
            return Err(AppError::InvalidOperation(format!("Person with id {} does not exist", id)));
        };
        if released > 0 {
            tracing::info!("People: released {} book(s) held by person id={}", released, id);
        }
        tracing::info!("People: deleted person id={}", id);
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        self.repository.people.count().await
    }
}
