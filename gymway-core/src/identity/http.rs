use async_trait::async_trait;
use reqwest::Method;
use std::sync::{Mutex, PoisonError};

use super::{
    AuthResponse, AuthStatus, IdentityError, IdentityProvider, LoginRequest, RegisterRequest,
    Session,
};
use crate::models::{ProfileUpdate, Role, User};
use crate::remote::collections::USERS;
use crate::remote::ApiClient;
use crate::validation::{validate_login, validate_profile_update, validate_registration};

/// [`IdentityProvider`] backed by the document server's `/auth` routes.
///
/// The bearer token lives in the shared [`ApiClient`], so a remote store
/// built from the same client is authenticated by a successful login.
#[derive(Debug)]
pub struct HttpIdentityClient {
    api: ApiClient,
    uid: Mutex<Option<String>>,
}

impl HttpIdentityClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            uid: Mutex::new(None),
        }
    }

    /// Restores a session saved by an earlier process.
    pub fn with_session(api: ApiClient, session: Session) -> Self {
        let client = Self::new(api.with_token(session.token));
        client.set_uid(Some(session.uid));
        client
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The current session, if signed in.
    pub fn session(&self) -> Option<Session> {
        let uid = self.current_uid()?;
        let token = self.api.token()?;
        Some(Session { uid, token })
    }

    fn set_uid(&self, uid: Option<String>) {
        *self.uid.lock().unwrap_or_else(PoisonError::into_inner) = uid;
    }

    fn start_session(&self, auth: &AuthResponse) {
        self.api.set_token(Some(auth.token.clone()));
        self.set_uid(Some(auth.uid.clone()));
    }

    fn require_session(&self) -> Result<(), IdentityError> {
        if self.api.token().is_none() {
            return Err(IdentityError::NotSignedIn);
        }
        Ok(())
    }
}

fn user_path(uid: &str) -> String {
    format!("/{}/{}", USERS, urlencoding::encode(uid))
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<String, IdentityError> {
        validate_registration(email, password, display_name)?;

        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            display_name: display_name.trim().to_string(),
            role,
        };
        let auth: AuthResponse = self
            .api
            .send_json(Method::POST, "/auth/register", &request)
            .await?;

        self.start_session(&auth);
        tracing::info!("Registered {} as {}", request.email, auth.uid);
        Ok(auth.uid)
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        validate_login(email, password)?;

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .api
            .send_json(Method::POST, "/auth/login", &request)
            .await?;

        // The session is kept so the caller can check or resend verification.
        self.start_session(&auth);
        if !auth.email_verified {
            tracing::info!("Login of {} blocked until email is verified", auth.uid);
            return Err(IdentityError::EmailNotVerified);
        }

        tracing::info!("Signed in as {}", auth.uid);
        Ok(auth.uid)
    }

    async fn fetch_profile(&self, uid: &str) -> Result<User, IdentityError> {
        self.require_session()?;
        let mut user: User = self.api.get_json(&user_path(uid)).await?;
        if user.uid.is_empty() {
            user.uid = uid.to_string();
        }
        Ok(user)
    }

    async fn update_profile(
        &self,
        uid: &str,
        update: &ProfileUpdate,
    ) -> Result<(), IdentityError> {
        validate_profile_update(update)?;
        self.require_session()?;
        if update.is_empty() {
            tracing::debug!("Empty profile update for {}, nothing to send", uid);
            return Ok(());
        }

        let _: serde_json::Value = self
            .api
            .send_json(Method::PATCH, &user_path(uid), update)
            .await?;
        tracing::info!("Updated profile of {}", uid);
        Ok(())
    }

    async fn check_email_verified(&self) -> Result<bool, IdentityError> {
        self.require_session()?;
        let status: AuthStatus = self.api.get_json("/auth/status").await?;
        Ok(status.email_verified)
    }

    async fn resend_verification(&self) -> Result<(), IdentityError> {
        self.require_session()?;
        self.api.send(Method::POST, "/auth/resend").await?;
        tracing::info!("Verification email requested");
        Ok(())
    }

    async fn sign_out(&self) {
        if self.api.token().is_some() {
            if let Err(e) = self.api.send(Method::POST, "/auth/logout").await {
                tracing::warn!("Server-side logout failed: {}", e);
            }
        }
        self.api.set_token(None);
        self.set_uid(None);
        tracing::info!("Signed out");
    }

    fn current_uid(&self) -> Option<String> {
        self.uid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    fn client() -> HttpIdentityClient {
        // Nothing listens here; tests only cover paths that fail before I/O.
        HttpIdentityClient::new(ApiClient::new("http://127.0.0.1:9"))
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_before_io() {
        let err = client()
            .register("a@b.com", "12345", "Alex", Role::Athlete)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IdentityError::Validation(ValidationError::PasswordTooShort { min: 6 })
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_blank_fields() {
        let err = client().login("", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "Email is required");
    }

    #[tokio::test]
    async fn test_status_requires_session() {
        let err = client().check_email_verified().await.unwrap_err();
        assert!(matches!(err, IdentityError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_restored_session() {
        let client = HttpIdentityClient::with_session(
            ApiClient::new("localhost:8080"),
            Session {
                uid: "u1".to_string(),
                token: "tok".to_string(),
            },
        );
        assert_eq!(client.current_uid().as_deref(), Some("u1"));
        assert_eq!(client.session().unwrap().token, "tok");
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_when_server_unreachable() {
        let client = HttpIdentityClient::with_session(
            ApiClient::new("http://127.0.0.1:9"),
            Session {
                uid: "u1".to_string(),
                token: "tok".to_string(),
            },
        );
        client.sign_out().await;
        assert!(client.session().is_none());
        assert!(client.api().token().is_none());
    }
}
