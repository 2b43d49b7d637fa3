//! Server configuration.
//!
//! Environment variables:
//! - `GYMWAY_PORT`: port to listen on (default: 8080)
//! - `GYMWAY_DATA_DIR`: document and account storage (default: ~/.local/share/gymway-server)
//! - `GYMWAY_CONFIG`: path to config file (default: ~/.config/gymway-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! public_url: "https://gym.example.com"
//! smtp:
//!   smtp_host: "smtp.example.com"
//!   smtp_port: 587
//!   smtp_user: "mailer"
//!   smtp_pass: "secret"
//!   from_email: "noreply@example.com"
//! ```
//!
//! Every field is optional. Without `smtp`, verification links are logged.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::email::EmailConfig;

pub const DEFAULT_PORT: u16 = 8080;

/// Contents of the YAML config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub smtp: Option<EmailConfig>,
}

impl ConfigFile {
    /// Reads the config file. A missing or malformed file gives the defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                ConfigFile::default()
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    /// Base URL used in verification links.
    pub public_url: String,
    pub smtp: Option<EmailConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables and the config file.
    pub fn from_env() -> Self {
        let port = std::env::var("GYMWAY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_dir = std::env::var("GYMWAY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let config_path = std::env::var("GYMWAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("gymway-server")
                    .join("config.yaml")
            });

        let file = ConfigFile::load(&config_path);
        Self::from_parts(port, data_dir, config_path, file)
    }

    fn from_parts(port: u16, data_dir: PathBuf, config_path: PathBuf, file: ConfigFile) -> Self {
        let public_url = file
            .public_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            port,
            data_dir,
            config_path,
            public_url,
            smtp: file.smtp,
        }
    }
}

/// Default server data directory, shared with the admin tool.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gymway-server")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let file = ConfigFile::load(&temp_dir.path().join("none.yaml"));
        assert!(file.public_url.is_none());
        assert!(file.smtp.is_none());
    }

    #[test]
    fn test_public_url_defaults_to_localhost() {
        let config = ServerConfig::from_parts(
            9000,
            PathBuf::from("/data"),
            PathBuf::from("/config.yaml"),
            ConfigFile::default(),
        );
        assert_eq!(config.public_url, "http://localhost:9000");
    }

    #[test]
    fn test_load_file_with_smtp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "public_url: https://gym.example.com/\nsmtp:\n  smtp_host: mail.example.com\n  from_email: noreply@example.com\n",
        )
        .unwrap();

        let config =
            ServerConfig::from_parts(8080, PathBuf::from("/data"), path.clone(), ConfigFile::load(&path));
        assert_eq!(config.public_url, "https://gym.example.com");
        assert_eq!(config.smtp.unwrap().smtp_host, "mail.example.com");
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "smtp: [not, a, map]").unwrap();

        assert!(ConfigFile::load(&path).smtp.is_none());
    }
}
