//! Borrower (library patron) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// PESEL: eleven digits
pub(crate) static PESEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{11}$").expect("valid regex"));

/// Borrower record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub pesel: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Borrower query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowerQuery {
    /// Matches first or last name
    pub name: Option<String>,
    pub pesel: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create borrower request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
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
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 10, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
}

/// Update borrower request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBorrower {
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
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub postal_code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
}
