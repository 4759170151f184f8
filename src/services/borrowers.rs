//! Borrower management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
    repository::{identity::Identity, Repository},
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
}

impl BorrowersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &BorrowerQuery) -> AppResult<(Vec<Borrower>, i64)> {
        self.repository.borrowers.search(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Borrower> {
        self.repository.borrowers.get_by_id(id).await
    }

    /// Create a borrower; PESEL, email and phone number must be unused
    pub async fn create(&self, data: CreateBorrower) -> AppResult<Borrower> {
        data.validate()?;
        let identity = Identity {
            pesel: Some(&data.pesel),
            email: data.email.as_deref(),
            phone_number: data.phone_number.as_deref(),
        };
        self.ensure_identity_free(identity, None).await?;

        let borrower = self.repository.borrowers.create(&data).await?;
        tracing::info!(borrower_id = borrower.id, "Borrower created");
        Ok(borrower)
    }

    pub async fn update(&self, id: i32, data: UpdateBorrower) -> AppResult<Borrower> {
        data.validate()?;
        self.repository.borrowers.get_by_id(id).await?;
        let identity = Identity {
            pesel: data.pesel.as_deref(),
            email: data.email.as_deref(),
            phone_number: data.phone_number.as_deref(),
        };
        self.ensure_identity_free(identity, Some(id)).await?;

        self.repository.borrowers.update(id, &data).await
    }

    /// Delete a borrower that never borrowed anything
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.borrowers.get_by_id(id).await?;
        if self.repository.borrowers.has_loans(id).await? {
            return Err(AppError::BusinessRule(format!(
                "Borrower with id {} has loans and cannot be deleted",
                id
            )));
        }
        self.repository.borrowers.delete(id).await?;
        tracing::info!(borrower_id = id, "Borrower deleted");
        Ok(())
    }

    async fn ensure_identity_free(&self, identity: Identity<'_>, exclude_id: Option<i32>) -> AppResult<()> {
        let taken = self
            .repository
            .borrowers
            .taken_identity_field(identity, exclude_id)
            .await?;
        match taken {
            Some(field) => Err(AppError::Conflict(format!(
                "A borrower with this {} already exists",
                field
            ))),
            None => Ok(()),
        }
    }
}
