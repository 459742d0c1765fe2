//! Catalog and loan endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        account::Role,
        item::{CreateItem, Item, UpdateItem},
        loan::{LoanDetails, LoanRecord},
    },
    AppState,
};

use super::{AppJson, AppPath, AuthenticatedAccount};

/// Single item response
#[derive(Serialize, ToSchema)]
pub struct ItemResponse {
    pub message: String,
    pub book: Item,
}

/// Catalog listing
#[derive(Serialize, ToSchema)]
pub struct ItemsResponse {
    pub message: String,
    pub books: Vec<Item>,
}

/// Borrow or return receipt
#[derive(Serialize, ToSchema)]
pub struct LoanReceipt {
    pub message: String,
    pub transaction: LoanRecord,
    pub book: Item,
}

/// Loan listing
#[derive(Serialize, ToSchema)]
pub struct TransactionsResponse {
    pub message: String,
    pub transactions: Vec<LoanDetails>,
}

/// Add an item to the catalog
#[utoipa::path(
    post,
    path = "/books/add-books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateItem,
    responses(
        (status = 201, description = "Book added", body = ItemResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Admins only", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppJson(request): AppJson<CreateItem>,
) -> AppResult<(StatusCode, Json<ItemResponse>)> {
    caller.require_admin()?;

    let book = state.services.catalog.add(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            message: "Book added successfully".to_string(),
            book,
        }),
    ))
}

/// Update the provided fields of an item
#[utoipa::path(
    put,
    path = "/books/update-books/{book_id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Book updated", body = ItemResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Admins only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(book_id): AppPath<Uuid>,
    AppJson(changes): AppJson<UpdateItem>,
) -> AppResult<Json<ItemResponse>> {
    caller.require_admin()?;

    let book = state.services.catalog.update(book_id, changes).await?;
    Ok(Json(ItemResponse {
        message: "Book updated successfully".to_string(),
        book,
    }))
}

/// Remove an item from the catalog
#[utoipa::path(
    delete,
    path = "/books/delete-books/{book_id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = ItemResponse),
        (status = 403, description = "Admins only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(book_id): AppPath<Uuid>,
) -> AppResult<Json<ItemResponse>> {
    caller.require_admin()?;

    let book = state.services.catalog.delete(book_id).await?;
    Ok(Json(ItemResponse {
        message: "Book deleted successfully".to_string(),
        book,
    }))
}

/// List the whole catalog
#[utoipa::path(
    get,
    path = "/books/all-books",
    tag = "books",
    responses(
        (status = 200, description = "Catalog", body = ItemsResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<ItemsResponse>> {
    let books = state.services.catalog.list_all().await?;
    Ok(Json(ItemsResponse {
        message: "Books fetched successfully".to_string(),
        books,
    }))
}

/// Borrow one copy of an item
#[utoipa::path(
    post,
    path = "/books/borrow-books/{book_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book borrowed", body = LoanReceipt),
        (status = 400, description = "No available copies", body = crate::error::ErrorResponse),
        (status = 403, description = "Members only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(book_id): AppPath<Uuid>,
) -> AppResult<Json<LoanReceipt>> {
    caller.require_any(&[Role::Member])?;

    let (transaction, book) = state.services.loans.borrow(caller.account_id, book_id).await?;
    Ok(Json(LoanReceipt {
        message: "Book borrowed successfully".to_string(),
        transaction,
        book,
    }))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/books/return-books/{book_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LoanReceipt),
        (status = 400, description = "Not borrowed by the caller", body = crate::error::ErrorResponse),
        (status = 403, description = "Members only", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(book_id): AppPath<Uuid>,
) -> AppResult<Json<LoanReceipt>> {
    caller.require_any(&[Role::Member])?;

    let (transaction, book) = state
        .services
        .loans
        .return_item(caller.account_id, book_id)
        .await?;
    Ok(Json(LoanReceipt {
        message: "Book returned successfully".to_string(),
        transaction,
        book,
    }))
}

/// Every loan, most recent first
#[utoipa::path(
    get,
    path = "/books/all-transactions",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All transactions", body = TransactionsResponse),
        (status = 403, description = "Admins and librarians only", body = crate::error::ErrorResponse)
    )
)]
pub async fn all_transactions(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
) -> AppResult<Json<TransactionsResponse>> {
    caller.require_any(&[Role::Admin, Role::Librarian])?;

    let transactions = state.services.loans.list_all().await?;
    Ok(Json(TransactionsResponse {
        message: "Transactions fetched successfully".to_string(),
        transactions,
    }))
}

/// The caller's own loans, most recent first
#[utoipa::path(
    get,
    path = "/books/member-transactions",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Member transactions", body = TransactionsResponse),
        (status = 403, description = "Members only", body = crate::error::ErrorResponse)
    )
)]
pub async fn member_transactions(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
) -> AppResult<Json<TransactionsResponse>> {
    caller.require_any(&[Role::Member])?;

    let transactions = state.services.loans.list_for_account(caller.account_id).await?;
    Ok(Json(TransactionsResponse {
        message: "Transactions fetched successfully".to_string(),
        transactions,
    }))
}
