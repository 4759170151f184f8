//! Employee (library staff) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::borrower::PESEL_RE;

/// Employee record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: i32,
    /// Subject id of the employee's login account, if any
    pub user_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub pesel: String,
    pub hired_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Matches first or last name
    pub name: Option<String>,
    pub pesel: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create employee request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEmployee {
    pub user_id: Option<i32>,
    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 20, message = "Phone number must be 3-20 characters"))]
    pub phone_number: Option<String>,
    #[validate(regex(path = *PESEL_RE, message = "PESEL must be 11 digits"))]
    pub pesel: String,
    pub hired_date: Option<NaiveDate>,
}

/// Update employee request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployee {
    pub user_id: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 20))]
    pub phone_number: Option<String>,
    #[validate(regex(path = *PESEL_RE, message = "PESEL must be 11 digits"))]
    pub pesel: Option<String>,
    pub hired_date: Option<NaiveDate>,
}
