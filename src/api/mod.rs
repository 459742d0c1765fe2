//! API handlers for Lendwell REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{request::Parts, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::account::AccountContext, AppState};

/// Extractor for the account behind a bearer token
pub struct AuthenticatedAccount(pub AccountContext);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    if e.is_missing() {
                        AppError::Authentication("Access denied. No token provided".to_string())
                    } else {
                        AppError::Authentication("Invalid authorization header format".to_string())
                    }
                })?;

        let context = state.services.gate.admit(bearer.token()).await?;
        Ok(AuthenticatedAccount(context))
    }
}

/// JSON body extractor whose rejections use the standard error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejections use the standard error body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Unknown methods on known paths are reported like unknown paths
async fn hide_method_not_allowed(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return route_not_found().await.into_response();
    }
    response
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/register-admin", post(auth::register_admin))
        .route("/auth/login-admin", post(auth::login_admin))
        .route("/auth/login-librarian", post(auth::login_librarian))
        .route("/auth/:id/approve", patch(auth::approve))
        .route("/auth/:id/update", put(auth::update))
        .route("/auth/:id/delete", delete(auth::delete_member))
        // Catalog
        .route("/books/add-books", post(books::add_book))
        .route("/books/update-books/:book_id", put(books::update_book))
        .route("/books/delete-books/:book_id", delete(books::delete_book))
        .route("/books/all-books", get(books::list_books))
        // Loans
        .route("/books/borrow-books/:book_id", post(books::borrow_book))
        .route("/books/return-books/:book_id", post(books::return_book))
        .route("/books/all-transactions", get(books::all_transactions))
        .route("/books/member-transactions", get(books::member_transactions))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .fallback(route_not_found)
        .layer(middleware::map_response(hide_method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
