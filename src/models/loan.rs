//! Loan and loan history models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{LoanDisplayStatus, LoanStatus};

/// Loans held longer than this many whole days are reported as overdue
pub const OVERDUE_AFTER_DAYS: i64 = 30;

/// Project a stored loan state onto the status shown in reports.
///
/// A returned loan whose checkout-to-return gap exceeds [`OVERDUE_AFTER_DAYS`]
/// is `Overdue`; a loan without a return date is `Borrowed`; anything else keeps
/// its stored status.
pub fn derive_display_status(
    loan_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    status: LoanStatus,
) -> LoanDisplayStatus {
    match return_date {
        Some(returned) if status == LoanStatus::Returned
            && (returned - loan_date).num_days() > OVERDUE_AFTER_DAYS =>
        {
            LoanDisplayStatus::Overdue
        }
        None => LoanDisplayStatus::Borrowed,
        Some(_) => status.into(),
    }
}

/// Loan row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub loan_date: DateTime<Utc>,
    /// Agreed return date
    pub return_date: Option<DateTime<Utc>>,
    /// When the copy actually came back
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Display status from the checkout and actual return times
    pub fn display_status(&self) -> LoanDisplayStatus {
        derive_display_status(self.loan_date, self.returned_at, self.status)
    }
}

/// Audit row paired with a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanHistory {
    pub id: i32,
    pub loan_id: i32,
    pub checkout_date: DateTime<Utc>,
    /// Agreed date while the loan is open, actual return time afterwards
    pub return_date: DateTime<Utc>,
}

/// Values inserted for one borrowed copy
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub book_id: i32,
    pub borrower_id: i32,
    pub loan_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

/// Borrow request: one loan per listed book
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_ids: Vec<i32>,
    pub borrower_id: i32,
    /// YYYY-MM-DD
    #[schema(value_type = String, format = Date)]
    pub loan_date: NaiveDate,
    /// YYYY-MM-DD
    #[schema(value_type = String, format = Date)]
    pub return_date: NaiveDate,
}

/// Loan list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<i32>,
    pub book_id: Option<i32>,
}

/// Loan as returned by the API, with its derived display status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: Loan,
    pub display_status: LoanDisplayStatus,
}

impl From<Loan> for LoanDetails {
    fn from(loan: Loan) -> Self {
        let display_status = loan.display_status();
        Self {
            loan,
            display_status,
        }
    }
}

/// One line of the loan history report
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanHistoryEntry {
    pub id: i32,
    pub loan_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub borrower_id: i32,
    pub borrower_name: String,
    pub checkout_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[sqlx(skip)]
    pub display_status: Option<LoanDisplayStatus>,
}

impl LoanHistoryEntry {
    /// Fill in `display_status` from the stored dates
    pub fn with_display_status(mut self) -> Self {
        self.display_status = Some(derive_display_status(
            self.checkout_date,
            self.return_date,
            self.status,
        ));
        self
    }
}
