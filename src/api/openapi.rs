//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health};

/// Registers the bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Lendwell API",
        version = "1.0.0",
        description = "Role-based lending REST API"
    ),
    paths(
        // Health
        health::health_check,
        // Accounts
        auth::register,
        auth::register_admin,
        auth::login,
        auth::login_admin,
        auth::login_librarian,
        auth::approve,
        auth::update,
        auth::delete_member,
        // Catalog
        books::add_book,
        books::update_book,
        books::delete_book,
        books::list_books,
        // Loans
        books::borrow_book,
        books::return_book,
        books::all_transactions,
        books::member_transactions,
    ),
    components(
        schemas(
            // Accounts
            auth::RegisterResponse,
            auth::LoginResponse,
            auth::AccountResponse,
            auth::DeletedAccountResponse,
            crate::models::account::Account,
            crate::models::account::AccountSummary,
            crate::models::account::DeletedAccount,
            crate::models::account::AccountStatus,
            crate::models::account::Role,
            crate::models::account::RegisterAccount,
            crate::models::account::RegisterAdmin,
            crate::models::account::UpdateAccount,
            crate::models::account::LoginRequest,
            // Catalog
            books::ItemResponse,
            books::ItemsResponse,
            crate::models::item::Item,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            // Loans
            books::LoanReceipt,
            books::TransactionsResponse,
            crate::models::loan::LoanRecord,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanAccount,
            crate::models::loan::LoanItem,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and account administration"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Borrowing, returns and transaction history")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
