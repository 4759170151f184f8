//! PostgreSQL unit of work for the loan ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    ledger::{LedgerStore, LedgerUnitOfWork},
    models::{
        book::Book,
        enums::{BookStatus, LoanStatus},
        loan::{Loan, LoanHistory, NewLoan},
    },
};

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: Pool<Postgres>,
}

impl PgLedgerStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> AppResult<Box<dyn LedgerUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

/// Wraps one database transaction; dropping it unfinished rolls back
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))
    }
}

#[async_trait]
impl LedgerUnitOfWork for PgUnitOfWork {
    async fn borrower_exists(&mut self, borrower_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE id = $1)")
            .bind(borrower_id)
            .fetch_one(self.conn()?)
            .await?;
        Ok(exists)
    }

    async fn lock_book(&mut self, book_id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(book)
    }

    async fn update_book_stock(&mut self, book_id: i32, quantity: i32, status: BookStatus) -> AppResult<()> {
        sqlx::query("UPDATE books SET quantity = $1, status = $2, updated_at = NOW() WHERE id = $3")
            .bind(quantity)
            .bind(status)
            .bind(book_id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, borrower_id, loan_date, return_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(loan.book_id)
        .bind(loan.borrower_id)
        .bind(loan.loan_date)
        .bind(loan.return_date)
        .bind(LoanStatus::Borrowed)
        .fetch_one(self.conn()?)
        .await?;
        Ok(loan)
    }

    async fn lock_loan(&mut self, loan_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(loan)
    }

    async fn mark_loan_returned(&mut self, loan_id: i32, returned_at: DateTime<Utc>) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, returned_at = $2, updated_at = NOW() WHERE id = $3 RETURNING *",
        )
        .bind(LoanStatus::Returned)
        .bind(returned_at)
        .bind(loan_id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))
    }

    async fn insert_history(
        &mut self,
        loan_id: i32,
        checkout_date: DateTime<Utc>,
        return_date: DateTime<Utc>,
    ) -> AppResult<LoanHistory> {
        let history = sqlx::query_as::<_, LoanHistory>(
            r#"
            INSERT INTO loan_history (loan_id, checkout_date, return_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(checkout_date)
        .bind(return_date)
        .fetch_one(self.conn()?)
        .await?;
        Ok(history)
    }

    async fn history_for_loan(&mut self, loan_id: i32) -> AppResult<Option<LoanHistory>> {
        let history = sqlx::query_as::<_, LoanHistory>(
            "SELECT * FROM loan_history WHERE loan_id = $1 ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .bind(loan_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(history)
    }

    async fn set_history_return(&mut self, history_id: i32, returned_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE loan_history SET return_date = $1 WHERE id = $2")
            .bind(returned_at)
            .bind(history_id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
