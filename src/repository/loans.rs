//! Loans repository for read-side queries

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanHistoryEntry, LoanQuery},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// List loans, newest first
    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM loans WHERE TRUE");

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(borrower_id) = query.borrower_id {
            builder.push(" AND borrower_id = ").push_bind(borrower_id);
        }
        if let Some(book_id) = query.book_id {
            builder.push(" AND book_id = ").push_bind(book_id);
        }
        builder.push(" ORDER BY loan_date DESC, id DESC");

        let loans = builder.build_query_as::<Loan>().fetch_all(&self.pool).await?;
        Ok(loans)
    }

    /// History rows joined with their loan, book and borrower
    pub async fn history(&self) -> AppResult<Vec<LoanHistoryEntry>> {
        let rows = sqlx::query_as::<_, LoanHistoryEntry>(
            r#"
            SELECT h.id, h.loan_id, l.book_id, b.title AS book_title,
                   l.borrower_id, br.first_name || ' ' || br.last_name AS borrower_name,
                   h.checkout_date, h.return_date, l.status
            FROM loan_history h
            JOIN loans l ON l.id = h.loan_id
            JOIN books b ON b.id = l.book_id
            JOIN borrowers br ON br.id = l.borrower_id
            ORDER BY h.checkout_date DESC, h.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoanHistoryEntry::with_display_status).collect())
    }
}
