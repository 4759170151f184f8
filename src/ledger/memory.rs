//! In-memory `LedgerStore` for tests.
//!
//! A unit of work holds the store-wide lock for its whole lifetime and edits a
//! private copy of the state, which replaces the shared state on commit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerStore, LedgerUnitOfWork};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        enums::{BookStatus, LoanStatus},
        loan::{Loan, LoanHistory, NewLoan},
    },
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    pub books: BTreeMap<i32, Book>,
    pub borrowers: BTreeSet<i32>,
    pub loans: BTreeMap<i32, Loan>,
    pub history: BTreeMap<i32, LoanHistory>,
    next_loan_id: i32,
    next_history_id: i32,
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedgerStore {
    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn book(id: i32, quantity: i32) -> Book {
        Book {
            id,
            title: format!("Book {}", id),
            isbn: None,
            category_id: None,
            status: BookStatus::for_quantity(quantity),
            publication_year: None,
            publisher: None,
            quantity,
            created_at: Self::epoch(),
            updated_at: Self::epoch(),
        }
    }

    pub fn loan(id: i32, new: &NewLoan) -> Loan {
        Loan {
            id,
            book_id: new.book_id,
            borrower_id: new.borrower_id,
            loan_date: new.loan_date,
            return_date: Some(new.return_date),
            returned_at: None,
            status: LoanStatus::Borrowed,
            created_at: Self::epoch(),
            updated_at: Self::epoch(),
        }
    }

    pub async fn add_book(&self, id: i32, quantity: i32) {
        self.state.lock().await.books.insert(id, Self::book(id, quantity));
    }

    pub async fn add_borrower(&self, id: i32) {
        self.state.lock().await.borrowers.insert(id);
    }

    pub async fn clear_history(&self) {
        self.state.lock().await.history.clear();
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> AppResult<Box<dyn LedgerUnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

impl MemoryUnitOfWork {
    fn loan_mut(&mut self, loan_id: i32) -> AppResult<&mut Loan> {
        self.working
            .loans
            .get_mut(&loan_id)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))
    }
}

#[async_trait]
impl LedgerUnitOfWork for MemoryUnitOfWork {
    async fn borrower_exists(&mut self, borrower_id: i32) -> AppResult<bool> {
        Ok(self.working.borrowers.contains(&borrower_id))
    }

    async fn lock_book(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        Ok(self.working.books.get(&book_id).cloned())
    }

    async fn update_book_stock(&mut self, book_id: i32, quantity: i32, status: BookStatus) -> AppResult<()> {
        if quantity < 0 {
            return Err(AppError::Database(sqlx::Error::Protocol(
                "quantity check constraint violated".to_string(),
            )));
        }
        let book = self
            .working
            .books
            .get_mut(&book_id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;
        book.quantity = quantity;
        book.status = status;
        Ok(())
    }

    async fn insert_loan(&mut self, new: &NewLoan) -> AppResult<Loan> {
        self.working.next_loan_id += 1;
        let loan = MemoryLedgerStore::loan(self.working.next_loan_id, new);
        self.working.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn lock_loan(&mut self, loan_id: i32) -> AppResult<Option<Loan>> {
        Ok(self.working.loans.get(&loan_id).cloned())
    }

    async fn mark_loan_returned(&mut self, loan_id: i32, returned_at: DateTime<Utc>) -> AppResult<Loan> {
        let loan = self.loan_mut(loan_id)?;
        loan.status = LoanStatus::Returned;
        loan.returned_at = Some(returned_at);
        Ok(loan.clone())
    }

    async fn insert_history(
        &mut self,
        loan_id: i32,
        checkout_date: DateTime<Utc>,
        return_date: DateTime<Utc>,
    ) -> AppResult<LoanHistory> {
        self.working.next_history_id += 1;
        let history = LoanHistory {
            id: self.working.next_history_id,
            loan_id,
            checkout_date,
            return_date,
        };
        self.working.history.insert(history.id, history.clone());
        Ok(history)
    }

    async fn history_for_loan(&mut self, loan_id: i32) -> AppResult<Option<LoanHistory>> {
        Ok(self
            .working
            .history
            .values()
            .find(|h| h.loan_id == loan_id)
            .cloned())
    }

    async fn set_history_return(&mut self, history_id: i32, returned_at: DateTime<Utc>) -> AppResult<()> {
        let history = self
            .working
            .history
            .get_mut(&history_id)
            .ok_or_else(|| AppError::NotFound(format!("History row {} not found", history_id)))?;
        history.return_date = returned_at;
        Ok(())
    }

    async fn commit(&mut self) -> AppResult<()> {
        *self.guard = self.working.clone();
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.working = (*self.guard).clone();
        Ok(())
    }
}
