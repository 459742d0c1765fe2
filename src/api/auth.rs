//! Account endpoints: registration, login and administration

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::account::{
        Account, AccountSummary, DeletedAccount, LoginRequest, RegisterAccount, RegisterAdmin,
        Registration, Role, UpdateAccount,
    },
    AppState,
};

use super::{AppJson, AppPath, AuthenticatedAccount};

/// Registration response
#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub account: AccountSummary,
}

/// Login response
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub account: AccountSummary,
}

/// Single account response
#[derive(Serialize, ToSchema)]
pub struct AccountResponse {
    pub message: String,
    pub account: Account,
}

/// Deleted account response
#[derive(Serialize, ToSchema)]
pub struct DeletedAccountResponse {
    pub message: String,
    pub account: DeletedAccount,
}

/// Register a member, or a librarian when called with an admin token
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterAccount,
    responses(
        (status = 201, description = "Account registered", body = RegisterResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Librarian registration without a token", body = crate::error::ErrorResponse),
        (status = 403, description = "Role not allowed", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthenticatedAccount>,
    AppJson(request): AppJson<RegisterAccount>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let role = request.role.unwrap_or_default();

    let (account, message) = match role {
        Role::Member => {
            let registration = Registration::try_from(request)?;
            let account = state.services.accounts.register_member(registration).await?;
            (account, "User registered successfully, awaiting approval")
        }
        Role::Librarian => {
            let AuthenticatedAccount(caller) = caller.ok_or_else(|| {
                AppError::Authentication("An admin token is required to register a librarian".to_string())
            })?;
            caller.require_admin()?;

            let registration = Registration::try_from(request)?;
            let account = state.services.accounts.register_librarian(registration).await?;
            (account, "Librarian registered successfully")
        }
        Role::Admin => {
            return Err(AppError::Authorization(
                "Admins must register through /auth/register-admin".to_string(),
            ));
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: message.to_string(),
            account: account.summary(),
        }),
    ))
}

/// Create the single admin account
#[utoipa::path(
    post,
    path = "/auth/register-admin",
    tag = "auth",
    request_body = RegisterAdmin,
    responses(
        (status = 201, description = "Admin registered", body = RegisterResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Invalid secret key", body = crate::error::ErrorResponse),
        (status = 409, description = "Admin already exists or email in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_admin(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterAdmin>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let account = state.services.accounts.register_admin(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Admin registered successfully".to_string(),
            account: account.summary(),
        }),
    ))
}

async fn login_as(state: &AppState, request: LoginRequest, role: Option<Role>) -> AppResult<Json<LoginResponse>> {
    let (token, account) = state
        .services
        .accounts
        .login(&request.email, &request.password, role)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        token_type: "Bearer".to_string(),
        account: account.summary(),
    }))
}

/// Log in with any approved account
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Account not approved", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    login_as(&state, request, None).await
}

/// Log in as the admin
#[utoipa::path(
    post,
    path = "/auth/login-admin",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn login_admin(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    login_as(&state, request, Some(Role::Admin)).await
}

/// Log in as a librarian
#[utoipa::path(
    post,
    path = "/auth/login-librarian",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a librarian", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn login_librarian(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    login_as(&state, request, Some(Role::Librarian)).await
}

/// Approve a pending account
#[utoipa::path(
    patch,
    path = "/auth/{id}/approve",
    tag = "auth",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account approved", body = AccountResponse),
        (status = 403, description = "Admins only", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<AccountResponse>> {
    caller.require_admin()?;

    let account = state.services.accounts.approve(id).await?;
    Ok(Json(AccountResponse {
        message: "User approved successfully".to_string(),
        account,
    }))
}

/// Update the provided fields of an account
#[utoipa::path(
    put,
    path = "/auth/{id}/update",
    tag = "auth",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = UpdateAccount,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Admins only", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateAccount>,
) -> AppResult<Json<AccountResponse>> {
    caller.require_admin()?;

    let account = state.services.accounts.update(id, request).await?;
    Ok(Json(AccountResponse {
        message: "User updated successfully".to_string(),
        account,
    }))
}

/// Delete a member account
#[utoipa::path(
    delete,
    path = "/auth/{id}/delete",
    tag = "auth",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Member deleted", body = DeletedAccountResponse),
        (status = 400, description = "Target is not a member", body = crate::error::ErrorResponse),
        (status = 403, description = "Admins only", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<AppState>,
    AuthenticatedAccount(caller): AuthenticatedAccount,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<DeletedAccountResponse>> {
    let account = state.services.accounts.delete_member(&caller, id).await?;
    Ok(Json(DeletedAccountResponse {
        message: "Member deleted successfully".to_string(),
        account,
    }))
}
