//! Business logic services

pub mod borrowers;
pub mod catalog;
pub mod employees;
pub mod loans;

use std::sync::Arc;

use crate::{config::LoansConfig, error::AppResult, ledger::LoanLedger, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub employees: employees::EmployeesService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans_config: &LoansConfig) -> Self {
        let ledger = LoanLedger::new(
            Arc::new(repository.ledger.clone()),
            loans_config.max_batch_size,
        );

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone()),
            employees: employees::EmployeesService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), ledger),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
