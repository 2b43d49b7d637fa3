//! In-memory token storage.
//!
//! [`TokenStore`] holds single-use email verification tokens that expire.
//! [`SessionStore`] maps bearer tokens to signed-in users. Neither survives
//! a server restart.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Verification tokens stay valid for 24 hours.
pub const VERIFICATION_EXPIRY_MINUTES: u64 = 24 * 60;

/// Data associated with a verification token.
#[derive(Debug, Clone)]
pub struct TokenData {
    /// Email address the token was issued for.
    pub email: String,
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// In-memory verification token store with expiry.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, TokenData>>,
    default_expiry: Duration,
}

impl TokenStore {
    /// Creates a new token store with the specified default expiry in minutes.
    pub fn new(expiry_minutes: u64) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            default_expiry: Duration::from_secs(expiry_minutes * 60),
        }
    }

    /// Creates a new token for the given email.
    pub fn create_token(&self, email: &str) -> String {
        self.create_token_with_expiry(email, self.default_expiry)
    }

    pub fn create_token_with_expiry(&self, email: &str, expiry: Duration) -> String {
        let token = generate_token();
        let now = Instant::now();

        let data = TokenData {
            email: email.to_string(),
            created_at: now,
            expires_at: now + expiry,
        };

        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), data);

        token
    }

    /// Verifies a token and returns its data if valid.
    ///
    /// The token is consumed even when it turns out to be expired.
    pub fn verify_token(&self, token: &str) -> Option<TokenData> {
        let data = self
            .tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)?;

        if Instant::now() > data.expires_at {
            return None;
        }

        Some(data)
    }

    /// Removes all expired tokens, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let before = tokens.len();
        tokens.retain(|_, data| data.expires_at > now);
        before - tokens.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(VERIFICATION_EXPIRY_MINUTES)
    }
}

/// Bearer session tokens, mapped to user ids.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `uid` and returns its bearer token.
    pub fn create(&self, uid: &str) -> String {
        let token = generate_token();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), uid.to_string());
        token
    }

    pub fn lookup(&self, token: &str) -> Option<String> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    /// Ends a session. Returns false if the token was unknown.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }
}

/// Generates a secure random token.
///
/// Returns 32 random bytes encoded as base64url (no padding).
fn generate_token() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_verify_valid_token() {
        let store = TokenStore::default();

        let token = store.create_token("test@example.com");
        let data = store.verify_token(&token).unwrap();

        assert_eq!(data.email, "test@example.com");
        assert!(data.expires_at > data.created_at);
    }

    #[test]
    fn test_verify_unknown_token() {
        let store = TokenStore::default();
        assert!(store.verify_token("nonexistent-token").is_none());
    }

    #[test]
    fn test_verify_expired_token() {
        let store = TokenStore::default();
        let token = store.create_token_with_expiry("test@example.com", Duration::from_secs(0));

        thread::sleep(Duration::from_millis(10));

        assert!(store.verify_token(&token).is_none());
    }

    #[test]
    fn test_token_is_single_use() {
        let store = TokenStore::default();
        let token = store.create_token("test@example.com");

        assert!(store.verify_token(&token).is_some());
        assert!(store.verify_token(&token).is_none());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = TokenStore::default();

        store.create_token_with_expiry("a@example.com", Duration::from_secs(0));
        store.create_token_with_expiry("b@example.com", Duration::from_secs(0));
        store.create_token("c@example.com");

        thread::sleep(Duration::from_millis(10));
        assert_eq!(store.len(), 3);

        assert_eq!(store.cleanup_expired(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sessions() {
        let sessions = SessionStore::new();

        let token = sessions.create("uid_1");
        assert_eq!(sessions.lookup(&token).as_deref(), Some("uid_1"));

        assert!(sessions.revoke(&token));
        assert!(sessions.lookup(&token).is_none());
        assert!(!sessions.revoke(&token));
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();

        // 32 bytes base64url = 43 characters
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_token());
    }
}
