//! # TOML Configuration Loader
//!
//! Loads [`StackforgeConfig`](super::StackforgeConfig) with fail-fast
//! semantics:
//!
//! 1. `config/stackforge.toml` — base configuration (required)
//! 2. `config/stackforge.{environment}.toml` — environment overlay (optional)
//! 3. `STACKFORGE__*` environment variables — final overrides
//!    (e.g. `STACKFORGE__WEB__BIND_ADDRESS=0.0.0.0:9090`)
//!
//! The configuration root defaults to `./config` and can be redirected with
//! `STACKFORGE_CONFIG_ROOT`.

use std::path::PathBuf;

use config::{Config, Environment, File};
use tracing::debug;

use super::StackforgeConfig;
use crate::error::{StackforgeError, StackforgeResult};

pub struct ConfigLoader {
    root: PathBuf,
    environment: String,
}

impl ConfigLoader {
    /// Create a loader for the given environment name.
    pub fn new(environment: &str) -> Self {
        let root = std::env::var("STACKFORGE_CONFIG_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        Self {
            root,
            environment: environment.to_string(),
        }
    }

    /// Create a loader for the environment from `STACKFORGE_ENV`.
    pub fn from_env() -> Self {
        Self::new(&crate::logging::get_environment())
    }

    /// Load and deserialize the full configuration.
    pub fn load(&self) -> StackforgeResult<StackforgeConfig> {
        let base = self.root.join("stackforge.toml");
        if !base.exists() {
            return Err(StackforgeError::ConfigurationError(format!(
                "base configuration file not found: {}",
                base.display()
            )));
        }

        let overlay = self
            .root
            .join(format!("stackforge.{}.toml", self.environment));

        debug!(
            base = %base.display(),
            overlay = %overlay.display(),
            overlay_present = overlay.exists(),
            environment = %self.environment,
            "Loading configuration"
        );

        let settings = Config::builder()
            .add_source(File::from(base))
            .add_source(File::from(overlay).required(false))
            .add_source(
                Environment::with_prefix("STACKFORGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StackforgeConfig = settings.try_deserialize()?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly serve requests.
    fn validate(&self, config: &StackforgeConfig) -> StackforgeResult<()> {
        if config.web.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(StackforgeError::ConfigurationError(format!(
                "web.bind_address is not a valid socket address: {}",
                config.web.bind_address
            )));
        }
        if config.database.max_connections == 0 {
            return Err(StackforgeError::ConfigurationError(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if config.web.rate_limiting.enabled && config.web.rate_limiting.requests_per_minute == 0 {
            return Err(StackforgeError::ConfigurationError(
                "web.rate_limiting.requests_per_minute must be greater than zero".to_string(),
            ));
        }
        if config.generator.max_files == 0 || config.generator.max_total_bytes == 0 {
            return Err(StackforgeError::ConfigurationError(
                "generator limits must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &std::path::Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn loader_for(root: &std::path::Path, environment: &str) -> ConfigLoader {
        ConfigLoader {
            root: root.to_path_buf(),
            environment: environment.to_string(),
        }
    }

    #[test]
    fn test_missing_base_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let result = loader_for(dir.path(), "test").load();
        assert!(matches!(
            result,
            Err(StackforgeError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_environment_overlay_wins_over_base() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "stackforge.toml",
            r#"
            [web]
            bind_address = "127.0.0.1:8080"
            request_timeout_ms = 30000
            "#,
        );
        write_config(
            dir.path(),
            "stackforge.staging.toml",
            r#"
            [web]
            bind_address = "127.0.0.1:9090"
            "#,
        );

        let config = loader_for(dir.path(), "staging").load().unwrap();
        assert_eq!(config.web.bind_address, "127.0.0.1:9090");
        assert_eq!(config.web.request_timeout_ms, 30000);
    }

    #[test]
    fn test_invalid_bind_address_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "stackforge.toml",
            r#"
            [web]
            bind_address = "not-an-address"
            request_timeout_ms = 30000
            "#,
        );

        let result = loader_for(dir.path(), "test").load();
        assert!(matches!(
            result,
            Err(StackforgeError::ConfigurationError(_))
        ));
    }
}
