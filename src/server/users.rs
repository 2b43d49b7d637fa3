//! Account store for authentication.
//!
//! Accounts live in `accounts.json` in the data directory, keyed by
//! lowercased email. Profile data is kept separately in the `users`
//! document collection.
//!
//! # File Format
//!
//! ```text
//! {
//!   "user@example.com": {
//!     "uid": "3f0c...",
//!     "email": "user@example.com",
//!     "salt": "...",
//!     "password_hash": "...",
//!     "email_verified": false,
//!     "created_at": "2025-01-01T00:00:00Z"
//!   }
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub uid: String,
    pub email: String,
    salt: String,
    password_hash: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    fn password_matches(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }
}

/// Errors that can occur in the account store.
#[derive(Debug)]
pub enum AccountError {
    /// I/O error reading or writing the accounts file.
    IoError(io::Error),
    /// The accounts file is not valid JSON.
    ParseError(String),
    /// An account with this email already exists.
    AlreadyExists(String),
    /// No account with this email.
    NotFound(String),
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountError::IoError(e) => write!(f, "I/O error: {}", e),
            AccountError::ParseError(e) => write!(f, "Failed to parse accounts file: {}", e),
            AccountError::AlreadyExists(email) => {
                write!(f, "An account for '{}' already exists", email)
            }
            AccountError::NotFound(email) => write!(f, "No account for '{}'", email),
        }
    }
}

impl std::error::Error for AccountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AccountError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Persistent account store.
///
/// Thread-safe via internal RwLock. Every change is written to disk
/// before the call returns.
#[derive(Debug)]
pub struct AccountStore {
    path: PathBuf,
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl AccountStore {
    /// Loads the account store from the data directory.
    ///
    /// A missing file gives an empty store. A corrupt file is logged and
    /// also gives an empty store.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("accounts.json");

        let accounts = match Self::read_accounts(&path) {
            Ok(accounts) => {
                tracing::info!("Loaded {} account(s)", accounts.len());
                accounts
            }
            Err(AccountError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No accounts.json found, starting with 0 accounts");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load accounts.json: {}", e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            accounts: RwLock::new(accounts),
        }
    }

    fn read_accounts(path: &Path) -> Result<BTreeMap<String, Account>, AccountError> {
        let bytes = std::fs::read(path).map_err(AccountError::IoError)?;
        serde_json::from_slice(&bytes).map_err(|e| AccountError::ParseError(e.to_string()))
    }

    fn persist(&self, accounts: &BTreeMap<String, Account>) -> Result<(), AccountError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(AccountError::IoError)?;
        }
        let bytes = serde_json::to_vec_pretty(accounts)
            .map_err(|e| AccountError::ParseError(e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, bytes).map_err(AccountError::IoError)?;
        std::fs::rename(&temp_path, &self.path).map_err(AccountError::IoError)
    }

    /// Creates an unverified account with a fresh uid.
    pub fn create(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let key = normalize_email(email);
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if accounts.contains_key(&key) {
            return Err(AccountError::AlreadyExists(key));
        }

        let salt = generate_salt();
        let account = Account {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: key.clone(),
            password_hash: hash_password(&salt, password),
            salt,
            email_verified: false,
            created_at: Utc::now(),
        };

        accounts.insert(key, account.clone());
        if let Err(e) = self.persist(&accounts) {
            accounts.remove(&account.email);
            return Err(e);
        }

        Ok(account)
    }

    /// Returns the account if the password matches.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<Account> {
        self.get_by_email(email)
            .filter(|account| account.password_matches(password))
    }

    pub fn get_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_email(email))
            .cloned()
    }

    pub fn get_by_uid(&self, uid: &str) -> Option<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|a| a.uid == uid)
            .cloned()
    }

    /// Marks the email verified and returns the updated account.
    pub fn mark_verified(&self, email: &str) -> Result<Account, AccountError> {
        let key = normalize_email(email);
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let account = accounts
            .get_mut(&key)
            .ok_or_else(|| AccountError::NotFound(key.clone()))?;
        account.email_verified = true;
        let updated = account.clone();

        self.persist(&accounts)?;
        Ok(updated)
    }

    /// All accounts, ordered by email.
    pub fn list(&self) -> Vec<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 of salt followed by password.
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
