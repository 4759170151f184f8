//! Borrowers repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{
    identity::{self, Identity},
    PageWindow,
};
use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrower by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    /// Search borrowers with pagination
    pub async fn search(&self, query: &BorrowerQuery) -> AppResult<(Vec<Borrower>, i64)> {
        let window = PageWindow::new(query.page, query.per_page);

        fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a BorrowerQuery) {
            builder.push(" WHERE TRUE");
            if let Some(ref name) = query.name {
                let pattern = format!("%{}%", name.to_lowercase());
                builder
                    .push(" AND (LOWER(first_name) LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR LOWER(last_name) LIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            if let Some(ref pesel) = query.pesel {
                builder.push(" AND pesel = ").push_bind(pesel);
            }
        }

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM borrowers");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM borrowers");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY last_name, first_name, id LIMIT ")
            .push_bind(window.per_page)
            .push(" OFFSET ")
            .push_bind(window.offset);
        let borrowers = select.build_query_as::<Borrower>().fetch_all(&self.pool).await?;

        Ok((borrowers, total))
    }

    /// Name of the first unique field already used by another borrower
    pub async fn taken_identity_field(
        &self,
        identity: Identity<'_>,
        exclude_id: Option<i32>,
    ) -> AppResult<Option<&'static str>> {
        identity::taken_field(&self.pool, "borrowers", identity, exclude_id).await
    }

    pub async fn create(&self, data: &CreateBorrower) -> AppResult<Borrower> {
        let row = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (first_name, last_name, email, phone_number, pesel, address, postal_code, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone_number)
        .bind(&data.pesel)
        .bind(&data.address)
        .bind(&data.postal_code)
        .bind(&data.city)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &UpdateBorrower) -> AppResult<Borrower> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE borrowers SET updated_at = NOW()");

        macro_rules! set_field {
            ($field:expr, $name:literal) => {
                if let Some(ref val) = $field {
                    builder.push(concat!(", ", $name, " = ")).push_bind(val);
                }
            };
        }

        set_field!(data.first_name, "first_name");
        set_field!(data.last_name, "last_name");
        set_field!(data.email, "email");
        set_field!(data.phone_number, "phone_number");
        set_field!(data.pesel, "pesel");
        set_field!(data.address, "address");
        set_field!(data.postal_code, "postal_code");
        set_field!(data.city, "city");

        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<Borrower>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    /// Whether any loan, open or returned, references the borrower
    pub async fn has_loans(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE borrower_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM borrowers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Borrower with id {} not found", id)));
        }
        Ok(())
    }
}
