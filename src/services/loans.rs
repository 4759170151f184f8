//! Loan management service

use crate::{
    error::AppResult,
    ledger::LoanLedger,
    models::loan::{CreateLoan, Loan, LoanDetails, LoanHistoryEntry, LoanQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    ledger: LoanLedger,
}

impl LoansService {
    pub fn new(repository: Repository, ledger: LoanLedger) -> Self {
        Self { repository, ledger }
    }

    /// Borrow one or more books; returns the new loan ids
    pub async fn borrow(&self, request: &CreateLoan) -> AppResult<Vec<i32>> {
        self.ledger.borrow(request).await
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.ledger.return_loan(loan_id).await.map(LoanDetails::from)
    }

    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<LoanDetails>> {
        let loans = self.repository.loans.list(query).await?;
        Ok(loans.into_iter().map(LoanDetails::from).collect())
    }

    pub async fn get(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.repository.loans.get_by_id(loan_id).await.map(LoanDetails::from)
    }

    /// Loans of one borrower, newest first
    pub async fn for_borrower(&self, borrower_id: i32) -> AppResult<Vec<LoanDetails>> {
        // Verify borrower exists
        self.repository.borrowers.get_by_id(borrower_id).await?;
        let query = LoanQuery {
            borrower_id: Some(borrower_id),
            ..Default::default()
        };
        let loans: Vec<Loan> = self.repository.loans.list(&query).await?;
        Ok(loans.into_iter().map(LoanDetails::from).collect())
    }

    /// History report with display status
    pub async fn history(&self) -> AppResult<Vec<LoanHistoryEntry>> {
        self.repository.loans.history().await
    }
}
