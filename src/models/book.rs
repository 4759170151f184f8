//! Book (catalog title) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{author::Author, category::Category, enums::BookStatus};

/// Book row from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub status: BookStatus,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    /// Copies currently on the shelf
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book with its category and authors resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub category: Option<Category>,
    pub status: BookStatus,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub quantity: i32,
    pub authors: Vec<Author>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookDetails {
    pub fn new(book: Book, category: Option<Category>, authors: Vec<Author>) -> Self {
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            category,
            status: book.status,
            publication_year: book.publication_year,
            publisher: book.publisher,
            quantity: book.quantity,
            authors,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Book query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive title substring
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1-20 characters"))]
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub publication_year: Option<i32>,
    #[validate(length(max = 255))]
    pub publisher: Option<String>,
    /// Defaults to a single copy
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub author_ids: Vec<i32>,
}

/// Update book request
///
/// Omitted and `null` fields both leave the column unchanged, so a partial
/// update cannot clear `isbn`, `category_id` or `publisher` back to NULL.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub publication_year: Option<i32>,
    #[validate(length(max = 255))]
    pub publisher: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    /// Replaces the author list when present
    pub author_ids: Option<Vec<i32>>,
}
