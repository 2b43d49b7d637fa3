//! Account registration, sign-in and profile access.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ProfileUpdate, Role, User};
use crate::remote::RemoteError;
use crate::validation::ValidationError;

pub use http::HttpIdentityClient;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Please verify your email address before signing in")]
    EmailNotVerified,

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Request(#[from] RemoteError),
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub uid: String,
    pub token: String,
    #[serde(default)]
    pub email_verified: bool,
}

/// Returned by `GET /auth/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub uid: String,
    pub email_verified: bool,
}

/// A signed-in user's id and bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and signs it in. The email starts unverified.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<String, IdentityError>;

    /// Signs in, rejecting accounts whose email is not yet verified.
    async fn login(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    async fn fetch_profile(&self, uid: &str) -> Result<User, IdentityError>;

    async fn update_profile(&self, uid: &str, update: &ProfileUpdate)
        -> Result<(), IdentityError>;

    async fn check_email_verified(&self) -> Result<bool, IdentityError>;

    async fn resend_verification(&self) -> Result<(), IdentityError>;

    /// Ends the session. Failures are logged, never returned.
    async fn sign_out(&self);

    fn current_uid(&self) -> Option<String>;
}
