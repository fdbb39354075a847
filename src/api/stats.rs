//! Statistics endpoint backing the dashboards

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct BorrowStats {
    pub active: i64,
    pub overdue: i64,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub books: i64,
    pub users: i64,
    pub borrows: BorrowStats,
}

/// Get dashboard counts (librarian or admin)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counts", body = StatsResponse),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_staff()?;

    let books = state.services.catalog.count().await?;
    let users = state.services.users.count().await?;
    let active = state.services.circulation.count_active().await?;
    let overdue = state.services.circulation.count_overdue().await?;

    Ok(Json(StatsResponse {
        books,
        users,
        borrows: BorrowStats { active, overdue },
    }))
}
