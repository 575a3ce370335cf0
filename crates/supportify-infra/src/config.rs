//! Configuration loader for Supportify.
//!
//! Reads `config.toml` from the data directory (`~/.supportify/` by default)
//! into [`AppConfig`], falling back to defaults when the file is missing or
//! malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use supportify_types::config::AppConfig;

use crate::sqlite::pool::default_database_url;

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "SUPPORTIFY_DATA_DIR";
/// Overrides `upstream.base_url`.
pub const UPSTREAM_URL_ENV: &str = "THIRD_PARTY_SERVER_URL";
/// Overrides `persistence.database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Resolve the data directory from the process environment.
pub fn resolve_data_dir() -> PathBuf {
    resolve_data_dir_with(|key| std::env::var(key).ok())
}

/// `SUPPORTIFY_DATA_DIR`, else `~/.supportify`, else `./.supportify`.
pub fn resolve_data_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".supportify");
    }

    PathBuf::from(".supportify")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`AppConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_app_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            AppConfig::default()
        }
    }
}

/// Apply `THIRD_PARTY_SERVER_URL` and `DATABASE_URL` on top of `config`.
/// Blank values are ignored.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_blank(UPSTREAM_URL_ENV) {
        config.upstream.base_url = url;
    }
    if let Some(url) = non_blank(DATABASE_URL_ENV) {
        config.persistence.database_url = Some(url);
    }
    config
}

/// Configured database URL, or the data directory's default database.
pub fn database_url(config: &AppConfig, data_dir: &Path) -> String {
    config
        .persistence
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
