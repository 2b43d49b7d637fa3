use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::Role;
use crate::validation::{validate_registration, ValidationError};

/// Where the sign-in flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Idle,
    Loading,
    Success(String),
    Error(String),
    NeedEmailVerification,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Idle => write!(f, "Signed out"),
            AuthState::Loading => write!(f, "Working..."),
            AuthState::Success(uid) => write!(f, "Signed in as {}", uid),
            AuthState::Error(message) => write!(f, "Error: {}", message),
            AuthState::NeedEmailVerification => {
                write!(f, "Check your inbox and verify your email address")
            }
        }
    }
}

pub struct AuthViewModel<P> {
    provider: Arc<P>,
    state: Arc<watch::Sender<AuthState>>,
}

impl<P> Clone for AuthViewModel<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            state: Arc::clone(&self.state),
        }
    }
}

impl<P: IdentityProvider + 'static> AuthViewModel<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            state: Arc::new(watch::Sender::new(AuthState::Idle)),
        }
    }

    pub fn state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Registers a new account.
    ///
    /// Input is validated first; invalid input moves straight to
    /// [`AuthState::Error`] and nothing is sent.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<JoinHandle<()>, ValidationError> {
        if let Err(e) = validate_registration(email, password, display_name) {
            self.state.send_replace(AuthState::Error(e.to_string()));
            return Err(e);
        }

        self.state.send_replace(AuthState::Loading);
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let (email, password, display_name) = (
            email.to_string(),
            password.to_string(),
            display_name.to_string(),
        );

        Ok(tokio::spawn(async move {
            let next = match provider
                .register(&email, &password, &display_name, role)
                .await
            {
                Ok(_) => AuthState::NeedEmailVerification,
                Err(e) => AuthState::Error(e.to_string()),
            };
            state.send_replace(next);
        }))
    }

    pub fn login(&self, email: &str, password: &str) -> JoinHandle<()> {
        self.state.send_replace(AuthState::Loading);
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let (email, password) = (email.to_string(), password.to_string());

        tokio::spawn(async move {
            let next = match provider.login(&email, &password).await {
                Ok(uid) => AuthState::Success(uid),
                Err(IdentityError::EmailNotVerified) => AuthState::NeedEmailVerification,
                Err(e) => AuthState::Error(e.to_string()),
            };
            state.send_replace(next);
        })
    }

    pub fn check_email_verification(&self) -> JoinHandle<()> {
        self.state.send_replace(AuthState::Loading);
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let next = match provider.check_email_verified().await {
                Ok(true) => AuthState::Success(provider.current_uid().unwrap_or_default()),
                Ok(false) => AuthState::Error("Your email has not been verified yet".to_string()),
                Err(e) => AuthState::Error(e.to_string()),
            };
            state.send_replace(next);
        })
    }

    pub fn resend_verification_email(&self) -> JoinHandle<()> {
        self.state.send_replace(AuthState::Loading);
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let next = match provider.resend_verification().await {
                Ok(()) => AuthState::NeedEmailVerification,
                Err(e) => {
                    tracing::warn!("Resending verification failed: {}", e);
                    AuthState::Error("Failed to send verification email".to_string())
                }
            };
            state.send_replace(next);
        })
    }

    pub fn sign_out(&self) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            provider.sign_out().await;
            state.send_replace(AuthState::Idle);
        })
    }

    pub fn reset_state(&self) {
        self.state.send_replace(AuthState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileUpdate, User};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockIdentity {
        calls: AtomicUsize,
        verified: AtomicBool,
    }

    impl MockIdentity {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentity {
        async fn register(
            &self,
            _email: &str,
            _password: &str,
            _display_name: &str,
            _role: Role,
        ) -> Result<String, IdentityError> {
            self.record();
            Ok("uid_1".to_string())
        }

        async fn login(&self, _email: &str, password: &str) -> Result<String, IdentityError> {
            self.record();
            if password != "secret1" {
                return Err(IdentityError::Request(
                    crate::remote::RemoteError::Unauthorized,
                ));
            }
            if !self.verified.load(Ordering::SeqCst) {
                return Err(IdentityError::EmailNotVerified);
            }
            Ok("uid_1".to_string())
        }

        async fn fetch_profile(&self, uid: &str) -> Result<User, IdentityError> {
            self.record();
            Ok(User {
                uid: uid.to_string(),
                ..Default::default()
            })
        }

        async fn update_profile(
            &self,
            _uid: &str,
            _update: &ProfileUpdate,
        ) -> Result<(), IdentityError> {
            self.record();
            Ok(())
        }

        async fn check_email_verified(&self) -> Result<bool, IdentityError> {
            self.record();
            Ok(self.verified.load(Ordering::SeqCst))
        }

        async fn resend_verification(&self) -> Result<(), IdentityError> {
            self.record();
            Ok(())
        }

        async fn sign_out(&self) {
            self.record();
        }

        fn current_uid(&self) -> Option<String> {
            Some("uid_1".to_string())
        }
    }

    fn view_model() -> (AuthViewModel<MockIdentity>, Arc<MockIdentity>) {
        let provider = Arc::new(MockIdentity::default());
        (AuthViewModel::new(Arc::clone(&provider)), provider)
    }

    #[tokio::test]
    async fn test_short_password_rejected_before_any_call() {
        let (vm, provider) = view_model();

        let result = vm.register("a@b.com", "12345", "Alex", Role::Athlete);

        assert!(result.is_err());
        assert_eq!(provider.calls(), 0);
        assert_eq!(
            vm.current_state(),
            AuthState::Error("Password must be at least 6 characters".to_string())
        );
    }

    #[tokio::test]
    async fn test_blank_display_name_rejected() {
        let (vm, provider) = view_model();
        assert!(vm.register("a@b.com", "secret1", " ", Role::Coach).is_err());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_register_needs_verification() {
        let (vm, provider) = view_model();

        let handle = vm
            .register("a@b.com", "secret1", "Alex", Role::Athlete)
            .unwrap();
        assert_eq!(vm.current_state(), AuthState::Loading);
        handle.await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(vm.current_state(), AuthState::NeedEmailVerification);
    }

    #[tokio::test]
    async fn test_login_unverified_then_verified() {
        let (vm, provider) = view_model();

        vm.login("a@b.com", "secret1").await.unwrap();
        assert_eq!(vm.current_state(), AuthState::NeedEmailVerification);

        vm.check_email_verification().await.unwrap();
        assert!(matches!(vm.current_state(), AuthState::Error(_)));

        provider.verified.store(true, Ordering::SeqCst);
        vm.check_email_verification().await.unwrap();
        assert_eq!(vm.current_state(), AuthState::Success("uid_1".to_string()));
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let (vm, _provider) = view_model();
        vm.login("a@b.com", "wrong").await.unwrap();
        assert_eq!(
            vm.current_state(),
            AuthState::Error("Not signed in or session expired".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_out_and_reset() {
        let (vm, provider) = view_model();
        provider.verified.store(true, Ordering::SeqCst);
        vm.login("a@b.com", "secret1").await.unwrap();

        vm.sign_out().await.unwrap();
        assert_eq!(vm.current_state(), AuthState::Idle);

        vm.resend_verification_email().await.unwrap();
        assert_eq!(vm.current_state(), AuthState::NeedEmailVerification);
        vm.reset_state();
        assert_eq!(vm.current_state(), AuthState::Idle);
    }
}
