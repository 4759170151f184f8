//! Employees repository

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{
    identity::{self, Identity},
    PageWindow,
};
use crate::{
    error::{AppError, AppResult},
    models::employee::{CreateEmployee, Employee, EmployeeQuery, UpdateEmployee},
};

#[derive(Clone)]
pub struct EmployeesRepository {
    pool: Pool<Postgres>,
}

impl EmployeesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee with id {} not found", id)))
    }

    /// Search employees with pagination
    pub async fn search(&self, query: &EmployeeQuery) -> AppResult<(Vec<Employee>, i64)> {
        let window = PageWindow::new(query.page, query.per_page);

        fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a EmployeeQuery) {
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

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM employees");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY last_name, first_name, id LIMIT ")
            .push_bind(window.per_page)
            .push(" OFFSET ")
            .push_bind(window.offset);
        let employees = select.build_query_as::<Employee>().fetch_all(&self.pool).await?;

        Ok((employees, total))
    }

    /// Name of the first unique field already used by another employee
    pub async fn taken_identity_field(
        &self,
        identity: Identity<'_>,
        exclude_id: Option<i32>,
    ) -> AppResult<Option<&'static str>> {
        identity::taken_field(&self.pool, "employees", identity, exclude_id).await
    }

    pub async fn create(&self, data: &CreateEmployee) -> AppResult<Employee> {
        let row = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (user_id, first_name, last_name, email, phone_number, pesel, hired_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone_number)
        .bind(&data.pesel)
        .bind(data.hired_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &UpdateEmployee) -> AppResult<Employee> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE employees SET updated_at = NOW()");

        macro_rules! set_field {
            ($field:expr, $name:literal) => {
                if let Some(ref val) = $field {
                    builder.push(concat!(", ", $name, " = ")).push_bind(val);
                }
            };
        }

        set_field!(data.user_id, "user_id");
        set_field!(data.first_name, "first_name");
        set_field!(data.last_name, "last_name");
        set_field!(data.email, "email");
        set_field!(data.phone_number, "phone_number");
        set_field!(data.pesel, "pesel");
        set_field!(data.hired_date, "hired_date");

        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee with id {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Employee with id {} not found", id)));
        }
        Ok(())
    }
}
