use gymway_core::Session;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// `remote` block of the config file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Document server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// Resync pending changes around commands (default: false)
    #[serde(default)]
    pub auto_sync: bool,
}

/// `session` block of the config file, written by `gym auth login`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    uid: String,
    token: String,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite cache
    pub database_path: ConfigValue<PathBuf>,
    pub server_url: ConfigValue<String>,
    pub auto_sync: bool,
    /// Signed-in user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ConfigValue<String>>,
    #[serde(skip)]
    session_token: Option<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Where sessions are saved
    #[serde(skip)]
    pub config_path: PathBuf,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    remote: Option<RemoteConfig>,
    session: Option<SessionFile>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default_db_path = Self::default_data_dir().join("gym.db");

        let mut database_path = ConfigValue::new(default_db_path, ConfigSource::Default);
        let mut server_url =
            ConfigValue::new(DEFAULT_SERVER_URL.to_string(), ConfigSource::Default);
        let mut auto_sync = false;
        let mut user_id = None;
        let mut session_token = None;
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            // An empty file parses as null
            let file_config: ConfigFile = if contents.trim().is_empty() {
                ConfigFile::default()
            } else {
                serde_yaml::from_str(&contents)
                    .map_err(|e| ConfigError::ParseError(path.clone(), e))?
            };

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(remote) = file_config.remote {
                if let Some(url) = remote.server_url {
                    server_url = ConfigValue::new(url, ConfigSource::File);
                }
                auto_sync = remote.auto_sync;
            }
            if let Some(session) = file_config.session {
                user_id = Some(ConfigValue::new(session.uid, ConfigSource::File));
                session_token = Some(session.token);
            }
        }

        if let Ok(db_path) = std::env::var("GYM_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("GYM_SERVER_URL") {
            server_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(uid) = std::env::var("GYM_USER_ID") {
            user_id = Some(ConfigValue::new(uid, ConfigSource::Environment));
        }
        if let Ok(token) = std::env::var("GYM_SESSION_TOKEN") {
            session_token = Some(token);
        }

        Ok(Self {
            database_path,
            server_url,
            auto_sync,
            user_id,
            session_token,
            config_file,
            config_path: path,
        })
    }

    /// The saved session, when both a user id and a token are known.
    pub fn session(&self) -> Option<Session> {
        let uid = self.user_id.as_ref()?.value.clone();
        let token = self.session_token.clone()?;
        Some(Session { uid, token })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/gym/
    /// - macOS: ~/Library/Application Support/gym/
    /// - Windows: %APPDATA%/gym/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gym")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/gym/
    /// - macOS: ~/Library/Application Support/gym/
    /// - Windows: %APPDATA%/gym/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gym")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Writes or removes the `session` block of the config file.
///
/// Other keys are kept; comments are not.
pub fn save_session(path: &Path, session: Option<&Session>) -> Result<(), ConfigError> {
    let existing = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        serde_yaml::from_str::<Value>(&contents)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?
    } else {
        Value::Null
    };

    let mut map = match existing {
        Value::Mapping(map) => map,
        _ => Mapping::new(),
    };

    match session {
        Some(session) => {
            let mut entry = Mapping::new();
            entry.insert("uid".into(), session.uid.clone().into());
            entry.insert("token".into(), session.token.clone().into());
            map.insert("session".into(), Value::Mapping(entry));
        }
        None => {
            map.remove("session");
        }
    }

    let contents = serde_yaml::to_string(&Value::Mapping(map))
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))?;
    }
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    WriteError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::WriteError(path, e) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
