//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod borrowers;
pub mod categories;
pub mod employees;
pub mod identity;
pub mod ledger;
pub mod loans;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 200;

/// Resolved pagination window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Page defaults to 1 and per_page to 20 (at most 200); huge pages saturate
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        Self {
            page,
            per_page,
            offset: (page - 1).saturating_mul(per_page),
        }
    }
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub authors: authors::AuthorsRepository,
    pub categories: categories::CategoriesRepository,
    pub borrowers: borrowers::BorrowersRepository,
    pub employees: employees::EmployeesRepository,
    pub loans: loans::LoansRepository,
    pub ledger: ledger::PgLedgerStore,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            borrowers: borrowers::BorrowersRepository::new(pool.clone()),
            employees: employees::EmployeesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            ledger: ledger::PgLedgerStore::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
