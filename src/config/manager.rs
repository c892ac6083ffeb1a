//! Configuration Manager

use super::{DefaultConfig, ServiceConfig};
use crate::Result;
use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Manages service settings loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load settings: built-in defaults, then `CONFSTORE_*` environment
    /// variables, then whatever the TOML file sets explicitly
    pub fn load_from_file(path: &Path) -> Result<ServiceConfig> {
        Self::load_layered(path, |name| std::env::var(name).ok())
    }

    /// Same layering as [`load_from_file`](Self::load_from_file) with an
    /// explicit environment lookup
    pub fn load_layered<F>(path: &Path, lookup: F) -> Result<ServiceConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut base = ServiceConfig::default();
        base.apply_env(lookup)?;

        let config = if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let overrides: toml::Table = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            let mut merged =
                toml::Table::try_from(&base).context("Failed to serialize base configuration")?;
            merge_tables(&mut merged, overrides);

            let config: ServiceConfig = merged
                .try_into()
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config
        } else {
            tracing::warn!(
                "Configuration file not found at {}, using environment and defaults",
                path.display()
            );
            base
        };

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        tracing::info!("Configuration loaded and validated successfully");
        Ok(config)
    }

    /// Build the default-value map from inline values and the defaults file
    pub fn load_defaults(config: &ServiceConfig) -> Result<DefaultConfig> {
        let inline = DefaultConfig::new(config.defaults.values.clone());
        inline
            .validate()
            .with_context(|| "Inline default configuration is invalid")?;

        let defaults = match &config.defaults.path {
            Some(path) => inline.merged_with(DefaultConfig::load_from_file(path)?),
            None => inline,
        };

        tracing::info!("Loaded {} default configuration keys", defaults.len());
        Ok(defaults)
    }
}

/// Overlay `overrides` onto `base`, descending into tables so a file that
/// sets one key of a section keeps the rest of that section
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

impl ServiceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_server_config()
            .with_context(|| "Server configuration validation failed")?;

        self.validate_notification_config()
            .with_context(|| "Notification configuration validation failed")?;

        self.validate_monitoring_config()
            .with_context(|| "Monitoring configuration validation failed")?;

        Ok(())
    }

    fn validate_server_config(&self) -> Result<()> {
        if self.server.shutdown_timeout.is_zero() {
            bail!("shutdown_timeout must be greater than 0");
        }

        if self.server.shutdown_timeout.as_secs() > 300 {
            bail!("shutdown_timeout cannot exceed 5 minutes");
        }

        Ok(())
    }

    fn validate_notification_config(&self) -> Result<()> {
        if self.notifications.channel_capacity == 0 {
            bail!("channel_capacity must be greater than 0");
        }

        if self.notifications.channel_capacity > 65536 {
            bail!("channel_capacity cannot exceed 65536");
        }

        Ok(())
    }

    fn validate_monitoring_config(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.monitoring.log_level.as_str()) {
            bail!("monitoring.log_level must be one of: {}", VALID_LOG_LEVELS.join(", "));
        }

        Ok(())
    }

    /// Apply `CONFSTORE_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind_addr) = lookup("CONFSTORE_BIND_ADDR") {
            self.server.bind_addr = bind_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid CONFSTORE_BIND_ADDR: {}", bind_addr))?;
        }

        if let Some(timeout) = lookup("CONFSTORE_SHUTDOWN_TIMEOUT") {
            self.server.shutdown_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid CONFSTORE_SHUTDOWN_TIMEOUT: {}", timeout))?;
        }

        if let Some(path) = lookup("CONFSTORE_DEFAULTS_PATH") {
            self.defaults.path = Some(PathBuf::from(path));
        }

        if let Some(log_level) = lookup("CONFSTORE_LOG_LEVEL") {
            self.monitoring.log_level = log_level;
        }

        if let Some(expose) = lookup("CONFSTORE_EXPOSE_INTERNAL") {
            self.management.expose_internal = expose
                .parse::<bool>()
                .with_context(|| format!("Invalid CONFSTORE_EXPOSE_INTERNAL: {}", expose))?;
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        bind: Option<&str>,
        port: Option<u16>,
        defaults: Option<&Path>,
        log_level: Option<&str>,
    ) {
        if let Some(bind_str) = bind {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.server.bind_addr = addr;
                tracing::info!("CLI override: bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid bind address provided: {}", bind_str);
            }
        }

        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
            tracing::info!("CLI override: port set to {}", port);
        }

        if let Some(path) = defaults {
            self.defaults.path = Some(path.to_path_buf());
            tracing::info!("CLI override: defaults file set to {}", path.display());
        }

        if let Some(level) = log_level {
            self.monitoring.log_level = level.to_string();
        }
    }
}
