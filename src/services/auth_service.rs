use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::context::RequestContext;
use super::error::ServiceError;
use crate::auth::{fingerprint, issue_token, verify_token, Claims, PasswordHasher, Principal, Role, VerifiedClaims};
use crate::database::models::{normalize_email, LoginRequest, RegisterUser, User};
use crate::database::{Resource, ResourceStore};

/// A freshly issued token together with the account it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: i64,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn ResourceStore<User>>,
    hasher: PasswordHasher,
    jwt_secret: String,
    expiry_hours: u64,
}

impl AuthService {
    pub fn new(users: Arc<dyn ResourceStore<User>>, hasher: PasswordHasher, jwt_secret: String, expiry_hours: u64) -> Self {
        Self {
            users,
            hasher,
            jwt_secret,
            expiry_hours,
        }
    }

    /// Public sign-up. The account is always a client.
    pub async fn register(&self, ctx: &RequestContext, input: RegisterUser) -> Result<AuthSession, ServiceError> {
        input.validate()?;

        let email = normalize_email(&input.email);
        if ctx.run(self.users.find_by_unique_key(&email)).await?.is_some() {
            return Err(ServiceError::AlreadyExists("user"));
        }

        let password_hash = self.hash(ctx, input.password).await?;
        let user = User::new(&email, password_hash, &input.first_name, &input.last_name, Role::Client);
        user.validate()?;

        let user = ctx.run(self.users.create(&user)).await?;
        info!("Registered client {} ({})", user.meta.id, user.email);
        self.session(user)
    }

    /// Email and password in, token out. Unknown accounts, wrong passwords and
    /// deactivated accounts are indistinguishable to the caller.
    pub async fn login(&self, ctx: &RequestContext, input: LoginRequest) -> Result<AuthSession, ServiceError> {
        input.validate()?;

        let email = normalize_email(&input.email);
        let user = match ctx.run(self.users.find_by_unique_key(&email)).await? {
            Some(user) => user,
            None => {
                warn!("Login failed: no account for {}", email);
                return Err(ServiceError::Unauthenticated);
            }
        };
        if !user.is_active {
            warn!("Login failed: account {} is deactivated", user.meta.id);
            return Err(ServiceError::Unauthenticated);
        }

        let verified = ctx
            .guard(async {
                self.hasher
                    .verify_blocking(input.password, user.password_hash.clone())
                    .await
                    .map_err(ServiceError::from)
            })
            .await;
        if let Err(e) = verified {
            warn!("Login failed for {}: {}", user.meta.id, e);
            return Err(e);
        }

        info!("User {} logged in", user.meta.id);
        self.session(user)
    }

    /// New token for a principal whose current token is still valid.
    pub async fn refresh(&self, ctx: &RequestContext, principal: &Principal) -> Result<AuthSession, ServiceError> {
        let user = self.me(ctx, principal).await?;
        self.session(user)
    }

    pub async fn me(&self, ctx: &RequestContext, principal: &Principal) -> Result<User, ServiceError> {
        match ctx.run(self.users.get_by_id(principal.id)).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(ServiceError::Unauthenticated),
        }
    }

    /// Verifies a bearer token. The specific failure is logged, the caller
    /// only learns that authentication failed.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, ServiceError> {
        verify_token(token, &self.jwt_secret).map_err(|e| {
            warn!("Rejected token {}: {}", fingerprint(token), e);
            ServiceError::Unauthenticated
        })
    }

    /// Principal for verified claims, with role and active flag taken from the
    /// live account rather than the token.
    pub async fn resolve_principal(&self, ctx: &RequestContext, claims: &VerifiedClaims) -> Result<Principal, ServiceError> {
        match ctx.run(self.users.get_by_id(claims.user_id)).await? {
            Some(user) => Ok(Principal::new(user.meta.id, user.role, user.is_active)),
            None => {
                warn!("Token subject {} has no live account", claims.user_id);
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    /// Creates the bootstrap administrator unless an account with that email
    /// already exists. Returns the account and whether it was created.
    pub async fn ensure_admin(&self, ctx: &RequestContext, email: &str, password: &str) -> Result<(User, bool), ServiceError> {
        let email = normalize_email(email);
        if let Some(existing) = ctx.run(self.users.find_by_unique_key(&email)).await? {
            if existing.role != Role::Admin {
                warn!("Bootstrap account {} exists with role {}", email, existing.role);
            }
            return Ok((existing, false));
        }

        let password_hash = self.hash(ctx, password.to_string()).await?;
        let admin = User::new(&email, password_hash, "System", "Administrator", Role::Admin);
        admin.validate()?;
        let admin = ctx.run(self.users.create(&admin)).await?;
        info!("Created bootstrap administrator {}", admin.email);
        Ok((admin, true))
    }

    pub fn issue(&self, user: &User) -> Result<(String, i64), ServiceError> {
        let claims = Claims::new(user.meta.id, &user.email, user.role, self.expiry_hours)
            .and_then(|claims| issue_token(&claims, &self.jwt_secret).map(|token| (claims, token)));
        let (claims, token) = claims.map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok((token, claims.exp))
    }

    fn session(&self, user: User) -> Result<AuthSession, ServiceError> {
        let (token, expires_at) = self.issue(&user)?;
        Ok(AuthSession { token, expires_at, user })
    }

    async fn hash(&self, ctx: &RequestContext, password: String) -> Result<String, ServiceError> {
        ctx.guard(async { self.hasher.hash_blocking(password).await.map_err(ServiceError::from) })
            .await
    }
}
