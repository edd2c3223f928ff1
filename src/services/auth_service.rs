use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::auth::{hash_password, verify_password, TokenService};
use crate::database::{DatabaseError, NewUser, User, UserRepository};

use super::ServiceError;

/// Registration input as received from the client.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
    /// Hashed once at the service's cost; unknown emails are checked against it
    /// so they take as long as a wrong password.
    dummy_hash: OnceCell<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, ServiceError> {
        let email = normalize_email(&registration.email);
        let username = registration.username.trim().to_string();

        let existing = self.users.find_by_email(&email).await.map_err(|e| {
            error!(error = %e, "Failed to check existing user");
            e
        })?;
        if existing.is_some() {
            warn!(email = %email, "Registration failed: email already in use");
            return Err(ServiceError::Conflict("email already in use".to_string()));
        }

        let password_hash = hash_password(&registration.password, self.bcrypt_cost)
            .await
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                e
            })?;

        let user = self
            .users
            .create(NewUser { username, email: email.clone(), password_hash })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration for the same address.
                DatabaseError::Duplicate(_) => {
                    warn!(email = %email, "Registration failed: email already in use");
                    ServiceError::Conflict("email already in use".to_string())
                }
                other => {
                    error!(error = %other, "User creation failed");
                    other.into()
                }
            })?;

        info!(user_id = user.id, "User registered");
        Ok(user.without_password())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let email = normalize_email(email);

        let user = match self.users.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                let dummy = self
                    .dummy_hash
                    .get_or_try_init(|| hash_password("unknown-account", self.bcrypt_cost))
                    .await?;
                verify_password(password, dummy).await?;
                warn!(email = %email, "Login failed: user not found");
                return Err(ServiceError::invalid_credentials());
            }
            Err(e) => {
                error!(email = %email, error = %e, "Login failed: DB error");
                return Err(e.into());
            }
        };

        if !verify_password(password, &user.password_hash).await? {
            warn!(email = %email, "Login failed: incorrect password");
            return Err(ServiceError::invalid_credentials());
        }

        let token = self.tokens.issue(user.id).map_err(|e| {
            error!(email = %email, error = %e, "JWT generation failed");
            e
        })?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome { user: user.without_password(), token })
    }
}
