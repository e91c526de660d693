//! Business logic services

pub mod catalog;
pub mod identity;
pub mod lending;
pub mod people;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub people: people::PeopleService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, lending_config: LendingConfig) -> Self {
        let lending = lending::LendingService::new(repository.clone(), lending_config.clone());
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), lending_config),
            people: people::PeopleService::new(repository, lending.clone()),
            lending,
        }
    }
}
