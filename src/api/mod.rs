//! API handlers for the Shelfmark REST endpoints

pub mod auth;
pub mod books;
pub mod circulation;
pub mod events;
pub mod health;
pub mod openapi;
pub mod settings;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        event::{ChangeEvent, Entity},
        user::UserClaims,
    },
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Bearer token
        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        // Validate JWT token using the secret from configuration
        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Generic paginated list response
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Middleware re-emitting permission-denied writes on the event stream as
/// developer-facing diagnostics. Only active outside production.
pub async fn denied_write_diagnostics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    if response.status() == StatusCode::FORBIDDEN
        && method != Method::GET
        && !state.config.is_production()
    {
        if let Some(entity) = entity_from_path(&path) {
            tracing::debug!(%method, %path, "write denied by role guard");
            state.services.events.publish(ChangeEvent::denied(entity));
        }
    }

    response
}

/// Map a request path to the entity its writes touch
fn entity_from_path(path: &str) -> Option<Entity> {
    if path.ends_with("/borrow") || path.ends_with("/return") || path.contains("/borrows") {
        Some(Entity::Borrows)
    } else if path.contains("/books") {
        Some(Entity::Books)
    } else if path.contains("/users") {
        Some(Entity::Users)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_map_to_entities() {
        assert_eq!(entity_from_path("/api/v1/books/3/borrow"), Some(Entity::Borrows));
        assert_eq!(entity_from_path("/api/v1/books/3/return"), Some(Entity::Borrows));
        assert_eq!(entity_from_path("/api/v1/users/5/borrows"), Some(Entity::Borrows));
        assert_eq!(entity_from_path("/api/v1/books/3"), Some(Entity::Books));
        assert_eq!(entity_from_path("/api/v1/users"), Some(Entity::Users));
        assert_eq!(entity_from_path("/api/v1/settings"), None);
    }
}
