//! Borrower endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
        loan::LoanDetails,
    },
};

use super::{AuthenticatedUser, MessageResponse, PaginatedBorrowers, PaginatedResponse};

/// List borrowers with search and pagination
#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(BorrowerQuery),
    responses(
        (status = 200, description = "List of borrowers", body = PaginatedBorrowers),
        (status = 403, description = "Staff role required")
    )
)]
pub async fn list_borrowers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowerQuery>,
) -> AppResult<Json<PaginatedBorrowers>> {
    claims.require_staff()?;

    let (borrowers, total) = state.services.borrowers.search(&query).await?;
    Ok(Json(PaginatedResponse::new(borrowers, total, query.page, query.per_page)))
}

#[utoipa::path(
    get,
    path = "/borrowers/{id}",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrower>> {
    claims.require_staff()?;

    Ok(Json(state.services.borrowers.get(id).await?))
}

/// Register a new borrower
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = Borrower),
        (status = 400, description = "Invalid input or PESEL, email or phone already used")
    )
)]
pub async fn create_borrower(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    claims.require_staff()?;

    let borrower = state.services.borrowers.create(data).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}

#[utoipa::path(
    put,
    path = "/borrowers/{id}",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrower ID")),
    request_body = UpdateBorrower,
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 400, description = "Invalid input or PESEL, email or phone already used"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn update_borrower(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    claims.require_staff()?;

    Ok(Json(state.services.borrowers.update(id, data).await?))
}

#[utoipa::path(
    delete,
    path = "/borrowers/{id}",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower deleted", body = MessageResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Borrower not found"),
        (status = 422, description = "Borrower has loans")
    )
)]
pub async fn delete_borrower(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.borrowers.delete(id).await?;
    Ok(Json(MessageResponse::new("Borrower deleted")))
}

/// Get loans for a specific borrower
#[utoipa::path(
    get,
    path = "/borrowers/{id}/loans",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower's loans, newest first", body = Vec<LoanDetails>),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_staff()?;

    Ok(Json(state.services.loans.for_borrower(id).await?))
}
