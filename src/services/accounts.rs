//! Account lifecycle: registration, login, approval, maintenance

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::account::{
        Account, AccountChanges, AccountContext, AccountStatus, DeletedAccount, NewAccount,
        RegisterAdmin, Registration, Role, UpdateAccount,
    },
    repository::Repository,
};

use super::{password::PasswordHasher, tokens::TokenService};

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    hasher: PasswordHasher,
    tokens: TokenService,
    admin_secret_key: String,
}

impl AccountsService {
    pub fn new(
        repository: Repository,
        hasher: PasswordHasher,
        tokens: TokenService,
        admin_secret_key: String,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
            admin_secret_key,
        }
    }

    /// Self-service registration. Members wait for approval before they
    /// can log in.
    pub async fn register_member(&self, registration: Registration) -> AppResult<Account> {
        let account = self
            .create(registration, Role::Member, AccountStatus::Pending)
            .await?;
        tracing::info!("Registered member {} (pending approval)", account.id);
        Ok(account)
    }

    /// Librarians are created by an admin and start out approved
    pub async fn register_librarian(&self, registration: Registration) -> AppResult<Account> {
        let account = self
            .create(registration, Role::Librarian, AccountStatus::Approved)
            .await?;
        tracing::info!("Registered librarian {}", account.id);
        Ok(account)
    }

    /// Bootstrap the single admin account, gated by the configured secret
    pub async fn register_admin(&self, request: RegisterAdmin) -> AppResult<Account> {
        if request.secret_key.as_deref() != Some(self.admin_secret_key.as_str()) {
            tracing::warn!("Admin registration refused: invalid secret key");
            return Err(AppError::Authorization("Invalid secret key".to_string()));
        }

        validator::Validate::validate(&request)?;
        let registration =
            Registration::from_fields(request.name, request.email, request.phone, request.password)?;

        if self.repository.accounts.admin_exists().await? {
            return Err(AppError::Conflict("Admin already exists".to_string()));
        }

        let account = self
            .create(registration, Role::Admin, AccountStatus::Approved)
            .await?;
        tracing::info!("Registered admin {}", account.id);
        Ok(account)
    }

    async fn create(
        &self,
        registration: Registration,
        role: Role,
        status: AccountStatus,
    ) -> AppResult<Account> {
        if self
            .repository
            .accounts
            .email_exists(&registration.email, None)
            .await?
        {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }

        let password_hash = self.hasher.hash(&registration.password).await?;

        self.repository
            .accounts
            .insert(&NewAccount {
                name: registration.name,
                email: registration.email,
                phone: registration.phone,
                password_hash,
                role,
                status,
            })
            .await
    }

    /// Check credentials and issue a token. `required_role` restricts the
    /// login to one role (admin and librarian login paths).
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        required_role: Option<Role>,
    ) -> AppResult<(String, Account)> {
        let account = self
            .repository
            .accounts
            .get_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(role) = required_role {
            if account.role != role {
                tracing::warn!("Login refused for {}: not a {}", account.id, role);
                return Err(AppError::Authorization(format!("Access denied: not a {}", role)));
            }
        }

        if !account.is_approved() {
            tracing::warn!("Login refused for {}: account pending approval", account.id);
            return Err(AppError::Authorization("Account not approved yet".to_string()));
        }

        if !self.hasher.verify(password, &account.password).await {
            tracing::warn!("Login refused for {}: wrong password", account.id);
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = self.tokens.issue(account.id, account.role)?;
        Ok((token, account))
    }

    /// Move a pending account to approved
    pub async fn approve(&self, id: Uuid) -> AppResult<Account> {
        match self.repository.accounts.approve_pending(id).await? {
            Some(account) => {
                tracing::info!("Approved account {}", id);
                Ok(account)
            }
            None => {
                // Missing accounts surface as NotFound
                self.repository.accounts.get_by_id(id).await?;
                Err(AppError::Conflict("User already approved".to_string()))
            }
        }
    }

    /// Overwrite the provided fields. The password is re-hashed only when
    /// a new one is given.
    pub async fn update(&self, id: Uuid, request: UpdateAccount) -> AppResult<Account> {
        let request = request.normalized()?;
        validator::Validate::validate(&request)?;
        self.repository.accounts.get_by_id(id).await?;

        if let Some(ref email) = request.email {
            if self.repository.accounts.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        let password_hash = match request.password {
            Some(ref password) => Some(self.hasher.hash(password).await?),
            None => None,
        };

        let changes = AccountChanges {
            name: request.name,
            email: request.email,
            phone: request.phone,
            password_hash,
        };

        let account = self.repository.accounts.update(id, &changes).await?;
        tracing::info!("Updated account {}", id);
        Ok(account)
    }

    /// Remove a member account. Staff accounts cannot be deleted here and
    /// the member's loan history is kept.
    pub async fn delete_member(&self, requester: &AccountContext, id: Uuid) -> AppResult<DeletedAccount> {
        requester.require_admin()?;

        let account = self.repository.accounts.get_by_id(id).await?;
        match account.role {
            Role::Member => {}
            Role::Admin | Role::Librarian => {
                return Err(AppError::BadRequest(
                    "Only member accounts can be deleted".to_string(),
                ));
            }
        }

        let deleted = self.repository.accounts.delete(id).await?;
        tracing::info!("Deleted member {}", id);
        Ok(DeletedAccount::from(deleted))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::repository::{memory::MemoryStore, MockAccountStore};

    const ADMIN_SECRET: &str = "bootstrap-secret";

    fn service_with(repository: Repository) -> AccountsService {
        AccountsService::new(
            repository,
            PasswordHasher::new(64, 1).unwrap(),
            TokenService::new("accounts-test", Duration::hours(1)),
            ADMIN_SECRET.to_string(),
        )
    }

    fn service() -> AccountsService {
        service_with(Repository::in_memory())
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Ada Lovelace".into(),
            email: email.into(),
            phone: "555-0100".into(),
            password: "engine".into(),
        }
    }

    fn admin_request(secret: &str, email: &str) -> RegisterAdmin {
        RegisterAdmin {
            secret_key: Some(secret.into()),
            name: Some("Root".into()),
            email: Some(email.into()),
            phone: Some("555-0000".into()),
            password: Some("rootpw".into()),
        }
    }

    fn admin_context() -> AccountContext {
        AccountContext {
            account_id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn member_must_be_approved_before_login() {
        let service = service();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();
        assert_eq!(member.role, Role::Member);
        assert_eq!(member.status, AccountStatus::Pending);

        let err = service.login("ada@example.org", "engine", None).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        service.approve(member.id).await.unwrap();
        let (token, account) = service.login("ada@example.org", "engine", None).await.unwrap();
        assert!(!token.is_empty());
        assert_eq!(account.id, member.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let service = service();
        service.register_member(registration("ada@example.org")).await.unwrap();

        let err = service
            .register_librarian(registration("ADA@example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn conflict_is_detected_before_any_write() {
        let mut accounts = MockAccountStore::new();
        accounts.expect_email_exists().returning(|_, _| Ok(true));
        accounts.expect_insert().never();

        let store = Arc::new(MemoryStore::default());
        let service = service_with(Repository {
            accounts: Arc::new(accounts),
            catalog: store.clone(),
            loans: store,
        });

        let err = service
            .register_member(registration("ada@example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn admin_bootstrap_checks_secret_then_uniqueness() {
        let service = service();

        let err = service
            .register_admin(admin_request("wrong", "root@example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let admin = service
            .register_admin(admin_request(ADMIN_SECRET, "root@example.org"))
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_approved());

        let err = service
            .register_admin(admin_request(ADMIN_SECRET, "other@example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn admin_bootstrap_requires_every_field() {
        let service = service();
        let mut request = admin_request(ADMIN_SECRET, "root@example.org");
        request.phone = None;

        let err = service.register_admin(request).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn login_checks_in_order() {
        let service = service();

        let err = service.login("nobody@example.org", "x", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        service
            .register_librarian(registration("lib@example.org"))
            .await
            .unwrap();

        let err = service
            .login("lib@example.org", "engine", Some(Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let err = service.login("lib@example.org", "wrong", None).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));

        let (_, account) = service
            .login("lib@example.org", "engine", Some(Role::Librarian))
            .await
            .unwrap();
        assert_eq!(account.role, Role::Librarian);
    }

    #[tokio::test]
    async fn approving_twice_is_a_conflict() {
        let service = service();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();
        service.approve(member.id).await.unwrap();

        assert!(matches!(service.approve(member.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(service.approve(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_approvals_succeed_once() {
        let service = service();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.approve(member.id).await })
            })
            .collect();

        let mut approved = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(account) => {
                    assert!(account.is_approved());
                    approved += 1;
                }
                Err(e) => assert!(matches!(e, AppError::Conflict(_))),
            }
        }
        assert_eq!(approved, 1);
    }

    #[tokio::test]
    async fn update_refuses_blank_name_and_phone() {
        let service = service();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();

        for update in [
            UpdateAccount {
                name: Some("   ".into()),
                ..Default::default()
            },
            UpdateAccount {
                phone: Some(" ".into()),
                ..Default::default()
            },
        ] {
            let err = service.update(member.id, update).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }

        let stored = service.repository.accounts.get_by_id(member.id).await.unwrap();
        assert_eq!(stored.name, member.name);
        assert_eq!(stored.phone, member.phone);

        let updated = service
            .update(
                member.id,
                UpdateAccount {
                    name: Some("  Ada King  ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada King");
    }

    #[tokio::test]
    async fn update_without_password_keeps_the_hash() {
        let service = service();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();

        let updated = service
            .update(
                member.id,
                UpdateAccount {
                    phone: Some("555-0199".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.phone, "555-0199");
        assert_eq!(updated.name, member.name);
        assert_eq!(updated.password, member.password);
    }

    #[tokio::test]
    async fn update_with_password_rehashes() {
        let service = service();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();
        service.approve(member.id).await.unwrap();

        let updated = service
            .update(
                member.id,
                UpdateAccount {
                    password: Some("difference".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(updated.password, member.password);

        assert!(service.login("ada@example.org", "engine", None).await.is_err());
        assert!(service.login("ada@example.org", "difference", None).await.is_ok());
    }

    #[tokio::test]
    async fn update_rejects_an_email_in_use() {
        let service = service();
        service.register_member(registration("ada@example.org")).await.unwrap();
        let other = service.register_member(registration("bob@example.org")).await.unwrap();

        let err = service
            .update(
                other.id,
                UpdateAccount {
                    email: Some("ada@example.org".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Keeping one's own address is not a conflict
        service
            .update(
                other.id,
                UpdateAccount {
                    email: Some("BOB@example.org".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn only_members_can_be_deleted() {
        let service = service();
        let librarian = service
            .register_librarian(registration("lib@example.org"))
            .await
            .unwrap();
        let member = service.register_member(registration("ada@example.org")).await.unwrap();

        let err = service
            .delete_member(&admin_context(), librarian.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let as_librarian = AccountContext {
            account_id: librarian.id,
            role: Role::Librarian,
        };
        let err = service.delete_member(&as_librarian, member.id).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let deleted = service.delete_member(&admin_context(), member.id).await.unwrap();
        assert_eq!(deleted.email, "ada@example.org");
        assert_eq!(deleted.role, Role::Member);
        assert!(matches!(
            service.repository.accounts.get_by_id(member.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
