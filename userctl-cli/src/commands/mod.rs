//! Subcommand implementations

pub mod migrate;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use userctl_server::Settings;

pub use migrate::{run_migrate, MigrateArgs};
pub use serve::{run_serve, ServeArgs};

/// Where settings come from, shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// TOML settings file
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl SettingsArgs {
    /// Defaults, then the file, then the environment, then these flags.
    pub fn load(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref()).with_context(|| match &self.config
        {
            Some(path) => format!("Failed to load settings from {}", path.display()),
            None => "Failed to load settings".to_string(),
        })?;

        if let Some(url) = self.database_url.as_deref().filter(|url| !url.is_empty()) {
            settings.database.url = url.to_string();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flag_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"postgres://file/db\"\nmax_connections = 3").unwrap();

        let args = SettingsArgs {
            config: Some(file.path().to_path_buf()),
            database_url: Some("postgres://flag/db".into()),
        };
        let settings = args.load().unwrap();
        assert_eq!(settings.database.url, "postgres://flag/db");
        assert_eq!(settings.database.max_connections, 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = SettingsArgs {
            config: Some(PathBuf::from("/nonexistent/userctl.toml")),
            database_url: None,
        };
        let err = args.load().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/userctl.toml"));
    }
}
