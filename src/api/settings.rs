//! Circulation settings endpoint

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct SettingsResponse {
    /// Loan period in days
    pub loan_period_days: i64,
    /// Fine charged per day overdue
    pub fine_per_day: Decimal,
}

/// Get current circulation settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Circulation settings", body = SettingsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<SettingsResponse>> {
    let settings = state.services.circulation.settings();

    Ok(Json(SettingsResponse {
        loan_period_days: settings.loan_period_days,
        fine_per_day: settings.fine_per_day,
    }))
}
