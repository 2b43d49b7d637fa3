use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::OutputFormat;
use crate::config::Config;
use crate::error::CliError;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# gym configuration

# Path to the local SQLite cache (default: ~/.local/share/gym/gym.db)
# database_path: gym.db

remote:
  # GymWay document server
  server_url: "http://localhost:8080"
  # Resend pending changes before reads and after writes
  auto_sync: false
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), CliError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                config.config_path.display()
                            );
                        }
                        println!();

                        println!("database_path: {}", config.database_path.value.display());
                        println!("  source: {}", config.database_path.source);
                        println!();

                        println!("server_url: {}", config.server_url.value);
                        println!("  source: {}", config.server_url.source);
                        println!();

                        println!("auto_sync: {}", config.auto_sync);
                        println!();

                        match &config.user_id {
                            Some(uid) => {
                                println!("user_id: {}", uid.value);
                                println!("  source: {}", uid.source);
                            }
                            None => println!("user_id: (not signed in)"),
                        }
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => init_config(&config.config_path),
        }
    }
}

fn init_config(config_path: &Path) -> Result<(), CliError> {
    if config_path.exists() {
        println!("Config file already exists: {}", config_path.display());
        println!("Use 'gym config show' to view current configuration.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(config_path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())?;

    println!("Created config file: {}", config_path.display());
    println!("\nEdit this file to customize your settings.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_loadable_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("gym").join("config.yaml");

        init_config(&config_path).unwrap();
        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.server_url.value, "http://localhost:8080");
        assert!(!config.auto_sync);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "remote:\n  auto_sync: true\n").unwrap();

        init_config(&config_path).unwrap();
        assert!(fs::read_to_string(&config_path).unwrap().contains("auto_sync: true"));
    }
}
