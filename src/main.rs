//! School Attendance Backend
//!
//! A production-grade REST backend with SQLite persistence for the org
//! hierarchy, student roster, staff accounts, and the attendance ledger.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod reconcile;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting School Attendance Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.jwt_secret == config::DEV_JWT_SECRET {
        tracing::warn!(
            "No JWT secret configured (ROLLCALL_JWT_SECRET). Using the development secret!"
        );
    }
    if config.admin_email.is_none() || config.admin_password.is_none() {
        tracing::warn!(
            "Admin credentials not configured (ROLLCALL_ADMIN_EMAIL / ROLLCALL_ADMIN_PASSWORD). Admin login is disabled."
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the secret for the auth layer
    let jwt_secret = state.config.jwt_secret.clone();

    // Routes that require a logged-in caller
    let protected_routes = Router::new()
        .route("/users/get-users", get(api::get_users))
        .route("/users/get-profile", get(api::get_profile))
        .route("/users/checkauth", get(api::check_auth))
        .route("/users/update-user/{id}", put(api::update_user))
        .route("/users/update-password/{id}", put(api::update_password))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_auth(jwt_secret.clone(), req, next)
        }));

    // API routes
    let api_routes = Router::new()
        // Sessions
        .route("/admin/login", post(api::admin_login))
        .route("/users/create", post(api::create_user))
        .route("/users/login", post(api::login_user))
        .route("/users/logout", post(api::logout_user))
        .route("/users/active-users", get(api::active_users))
        // Roster
        .route("/students/get-student", get(api::get_students))
        .route("/students/add-student", post(api::add_student))
        .route("/students/update-student/{id}", put(api::update_student))
        .route("/students/delete-record/{id}", delete(api::delete_student))
        // Attendance ledger
        .route("/attendances/save-attendance", post(api::save_attendance))
        .route("/attendances/get-attendance", get(api::get_attendance))
        .route("/attendances/delete", delete(api::delete_attendance))
        .route(
            "/Tattendances/save-attendance",
            post(api::save_slot_attendance),
        )
        // Org hierarchy
        .route("/school/add-school", post(api::add_school))
        .route("/school/get-school", get(api::get_schools))
        .route("/department/add-department", post(api::add_department))
        .route("/department/get-department", get(api::get_departments))
        .route("/course/add-course", post(api::add_course))
        .route("/course/get-course", get(api::get_courses))
        .merge(protected_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
