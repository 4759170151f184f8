//! Staff records service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::employee::{CreateEmployee, Employee, EmployeeQuery, UpdateEmployee},
    repository::{identity::Identity, Repository},
};

#[derive(Clone)]
pub struct EmployeesService {
    repository: Repository,
}

impl EmployeesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &EmployeeQuery) -> AppResult<(Vec<Employee>, i64)> {
        self.repository.employees.search(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Employee> {
        self.repository.employees.get_by_id(id).await
    }

    pub async fn create(&self, data: CreateEmployee) -> AppResult<Employee> {
        data.validate()?;
        let identity = Identity {
            pesel: Some(&data.pesel),
            email: data.email.as_deref(),
            phone_number: data.phone_number.as_deref(),
        };
        self.ensure_identity_free(identity, None).await?;

        let employee = self.repository.employees.create(&data).await?;
        tracing::info!(employee_id = employee.id, "Employee created");
        Ok(employee)
    }

    pub async fn update(&self, id: i32, data: UpdateEmployee) -> AppResult<Employee> {
        data.validate()?;
        self.repository.employees.get_by_id(id).await?;
        let identity = Identity {
            pesel: data.pesel.as_deref(),
            email: data.email.as_deref(),
            phone_number: data.phone_number.as_deref(),
        };
        self.ensure_identity_free(identity, Some(id)).await?;

        self.repository.employees.update(id, &data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.employees.delete(id).await?;
        tracing::info!(employee_id = id, "Employee deleted");
        Ok(())
    }

    async fn ensure_identity_free(&self, identity: Identity<'_>, exclude_id: Option<i32>) -> AppResult<()> {
        match self
            .repository
            .employees
            .taken_identity_field(identity, exclude_id)
            .await?
        {
            Some(field) => Err(AppError::Conflict(format!(
                "An employee with this {} already exists",
                field
            ))),
            None => Ok(()),
        }
    }
}
