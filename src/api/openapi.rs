//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, circulation, events, health, settings, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfmark API",
        version = "0.3.0",
        description = "Campus Library Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_my_profile,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::update_role,
        // Circulation
        circulation::borrow_book,
        circulation::return_book,
        circulation::get_user_borrows,
        circulation::my_borrows,
        // Events
        events::subscribe,
        // Stats
        stats::get_stats,
        // Settings
        settings::get_settings,
    ),
    components(
        schemas(
            // Auth
            auth::AuthResponse,
            crate::models::user::LoginRequest,
            crate::models::user::RegisterUser,
            // Books
            crate::models::book::Book,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::UserQuery,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateProfile,
            crate::models::user::UpdateRole,
            // Circulation
            circulation::BorrowResponse,
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowDetails,
            // Events
            crate::models::event::ChangeEvent,
            crate::models::event::Entity,
            crate::models::event::Action,
            // Stats
            stats::StatsResponse,
            stats::BorrowStats,
            // Settings
            settings::SettingsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "users", description = "User management"),
        (name = "circulation", description = "Borrow and return workflow"),
        (name = "events", description = "Live update stream"),
        (name = "stats", description = "Statistics"),
        (name = "settings", description = "Circulation settings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
