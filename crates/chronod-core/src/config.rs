use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Log files older than this many hours are purged by the janitor.
pub const DEFAULT_RETENTION_HOURS: u64 = 48;
pub const DB_FILE_NAME: &str = "chronod.db";

/// Top-level config (chronod.toml + CHRONOD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronodConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Shared API token. When set, /api/* and /mcp require a matching
    /// X-API-Key header. None or empty disables the check.
    pub token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            token: None,
        }
    }
}

/// Base directory holding the SQLite database and the logs/ subdirectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Retention window in hours for per-run log files.
    #[serde(default = "default_retention")]
    pub retention: u64,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_retention() -> u64 {
    DEFAULT_RETENTION_HOURS
}
fn default_data_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chronod", home)
}

impl ChronodConfig {
    /// Load config from a TOML file with CHRONOD_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.chronod/chronod.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ChronodConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CHRONOD_").split("_"))
            .extract()
            .map_err(|e| crate::error::ChronodError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chronod/chronod.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ChronodConfig::default();
        assert_eq!(config.gateway.port, DEFAULT_PORT);
        assert_eq!(config.gateway.bind, DEFAULT_BIND);
        assert!(config.gateway.token.is_none());
        assert_eq!(config.logs.retention, DEFAULT_RETENTION_HOURS);
        assert!(config.data.dir.ends_with(".chronod"));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        // Figment treats a missing TOML file as an empty provider.
        let config = ChronodConfig::load(Some("/nonexistent/chronod.toml")).unwrap();
        assert_eq!(config.gateway.port, DEFAULT_PORT);
    }
}
