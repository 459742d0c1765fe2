//! Account model, roles and token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Capability class of an account
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    Librarian,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Librarian => "Librarian",
            Role::Member => "Member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Librarian" => Ok(Role::Librarian),
            "Member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Approval state. Only moves Pending -> Approved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AccountStatus {
    #[default]
    Pending,
    Approved,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "Pending",
            AccountStatus::Approved => "Approved",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AccountStatus::Pending),
            "Approved" => Ok(AccountStatus::Approved),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }
}

// Both enums are stored as TEXT columns
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

text_column!(Role);
text_column!(AccountStatus);

/// Full account record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_approved(&self) -> bool {
        self.status == AccountStatus::Approved
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Public view of an account returned by registration endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// What is left of an account after deletion
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Account> for DeletedAccount {
    fn from(account: Account) -> Self {
        Self {
            name: account.name,
            email: account.email,
            role: account.role,
        }
    }
}

/// Self-service registration request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterAccount {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    /// Requested role (Member when omitted)
    pub role: Option<Role>,
}

/// Admin bootstrap request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdmin {
    pub secret_key: Option<String>,
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Registration fields after presence checks, password still in clear
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl Registration {
    /// Every field must be present and non-blank
    pub fn from_fields(
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        password: Option<String>,
    ) -> AppResult<Self> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        match (present(name), present(email), present(phone), present(password)) {
            (Some(name), Some(email), Some(phone), Some(password)) => Ok(Self {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                phone: phone.trim().to_string(),
                password,
            }),
            _ => Err(AppError::BadRequest("All fields are required".to_string())),
        }
    }
}

impl TryFrom<RegisterAccount> for Registration {
    type Error = AppError;

    fn try_from(request: RegisterAccount) -> AppResult<Self> {
        request.validate()?;
        Self::from_fields(request.name, request.email, request.phone, request.password)
    }
}

/// Row to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
}

/// Partial update request (admin only). Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAccount {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Phone must not be empty"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: Option<String>,
}

impl UpdateAccount {
    /// Trim the provided fields like a registration does. A field that is
    /// present but blank is refused rather than stored.
    pub fn normalized(self) -> AppResult<Self> {
        fn trimmed(value: Option<String>) -> AppResult<Option<String>> {
            match value {
                Some(v) if v.trim().is_empty() => {
                    Err(AppError::BadRequest("Fields must not be blank".to_string()))
                }
                Some(v) => Ok(Some(v.trim().to_string())),
                None => Ok(None),
            }
        }

        let password = match self.password {
            Some(p) if p.trim().is_empty() => {
                return Err(AppError::BadRequest("Fields must not be blank".to_string()))
            }
            other => other,
        };

        Ok(Self {
            name: trimmed(self.name)?,
            email: trimmed(self.email)?,
            phone: trimmed(self.phone)?,
            password,
        })
    }
}

/// Changes handed to the store. `password_hash` is only set when the
/// password itself changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountClaims {
    pub sub: String,
    pub account_id: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Identity admitted by the authorization gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountContext {
    pub account_id: Uuid,
    pub role: Role,
}

impl From<AccountClaims> for AccountContext {
    fn from(claims: AccountClaims) -> Self {
        Self {
            account_id: claims.account_id,
            role: claims.role,
        }
    }
}

impl AccountContext {
    /// Forbidden unless the role is one of `roles`
    pub fn require_any(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            return Ok(());
        }
        let message = match roles {
            [Role::Admin] => "Access denied: Admins only".to_string(),
            [Role::Librarian] => "Access denied: Librarians only".to_string(),
            [Role::Member] => "Access denied: Members only".to_string(),
            _ => format!(
                "Access denied: requires one of {}",
                roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
            ),
        };
        Err(AppError::Authorization(message))
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.require_any(&[Role::Admin])
    }
}
