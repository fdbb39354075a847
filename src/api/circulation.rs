//! Circulation endpoints: borrow, return, history

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrow::{Borrow, BorrowDetails},
        event::{Action, ChangeEvent, Entity},
    },
};

use super::AuthenticatedUser;

/// Borrow/return response
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub borrow: Borrow,
    pub message: String,
}

/// Borrow a book for the authenticated student
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Book borrowed", body = BorrowResponse),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Role mismatch, no copies available, department mismatch or duplicate borrow")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    claims.require_student()?;

    let borrow = state
        .services
        .circulation
        .borrow(claims.user_id, book_id)
        .await?;

    state
        .services
        .events
        .publish(ChangeEvent::new(Entity::Borrows, Action::Borrowed, borrow.id));
    state
        .services
        .events
        .publish(ChangeEvent::new(Entity::Books, Action::Updated, book_id));

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            message: format!("Book borrowed, due {}", borrow.due_date.date_naive()),
            borrow,
        }),
    ))
}

/// Return a borrowed book; charges the overdue fine if any
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book returned", body = BorrowResponse),
        (status = 422, description = "No open borrow of this book")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<BorrowResponse>> {
    claims.require_student()?;

    let borrow = state
        .services
        .circulation
        .return_book(claims.user_id, book_id)
        .await?;

    state
        .services
        .events
        .publish(ChangeEvent::new(Entity::Borrows, Action::Returned, borrow.id));
    state
        .services
        .events
        .publish(ChangeEvent::new(Entity::Books, Action::Updated, book_id));
    state
        .services
        .events
        .publish(ChangeEvent::new(Entity::Users, Action::Updated, claims.user_id));

    let message = match borrow.fine {
        Some(fine) if !fine.is_zero() => format!("Book returned, fine charged: {}", fine),
        _ => "Book returned on time".to_string(),
    };

    Ok(Json(BorrowResponse { borrow, message }))
}

/// Get a user's borrow history (staff, or the user themselves)
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Borrow history", body = Vec<BorrowDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    claims.require_staff_or_self(user_id)?;

    let borrows = state.services.circulation.get_user_borrows(user_id).await?;
    Ok(Json(borrows))
}

/// Get the authenticated user's own borrow history
#[utoipa::path(
    get,
    path = "/me/borrows",
    tag = "circulation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrow history", body = Vec<BorrowDetails>)
    )
)]
pub async fn my_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    let borrows = state
        .services
        .circulation
        .get_user_borrows(claims.user_id)
        .await?;
    Ok(Json(borrows))
}
