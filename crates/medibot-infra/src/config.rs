//! Application configuration loader for Medibot.
//!
//! Reads `config.toml` from the data directory (`~/.medibot/` in production)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed, then applies environment overrides for
//! deployment values and secrets.

use std::path::{Path, PathBuf};

use medibot_types::config::{AppConfig, LogFormat};
use secrecy::SecretString;

use crate::sqlite::pool::default_database_url;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "MEDIBOT_DATA_DIR";

/// Resolve the data directory: `MEDIBOT_DATA_DIR`, else `~/.medibot`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medibot")
}

/// Load configuration from `{data_dir}/config.toml` and the process environment.
pub async fn load_app_config(data_dir: &Path) -> AppConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load `{data_dir}/config.toml` without environment overrides.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config_file(data_dir: &Path) -> AppConfig {
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
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Overlay environment values onto `config`. Empty values are ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = var("MEDIBOT_HOST") {
        config.server.host = host;
    }
    if let Some(port) = var("MEDIBOT_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid MEDIBOT_PORT '{port}'"),
        }
    }
    if let Some(url) = var("MEDIBOT_PUBLIC_URL") {
        config.server.public_url = url;
    }
    if let Some(url) = var("DATABASE_URL") {
        config.database.url = Some(url);
    }

    if let Some(key) = var("SECRET_KEY") {
        config.auth.secret_key = Some(SecretString::from(key));
    }
    if let Some(id) = var("GOOGLE_CLIENT_ID") {
        config.auth.google_client_id = Some(id);
    }
    if let Some(secret) = var("GOOGLE_CLIENT_SECRET") {
        config.auth.google_client_secret = Some(SecretString::from(secret));
    }

    if let Some(url) = var("LLM_BASE_URL") {
        config.llm.base_url = url;
    }
    if let Some(model) = var("LLM_MODEL") {
        config.llm.model = model;
    }
    if let Some(key) = var("OPENROUTER_API_KEY") {
        config.llm.api_key = Some(SecretString::from(key));
    }

    if let Some(index) = var("PINECONE_INDEX") {
        config.retrieval.index_name = index;
    }
    if let Some(host) = var("PINECONE_INDEX_HOST") {
        config.retrieval.index_host = Some(host);
    }
    if let Some(key) = var("PINECONE_API_KEY") {
        config.retrieval.api_key = Some(SecretString::from(key));
    }

    if let Some(format) = var("MEDIBOT_LOG_FORMAT") {
        match format.parse::<LogFormat>() {
            Ok(format) => config.logging.format = format,
            Err(err) => tracing::warn!("Ignoring MEDIBOT_LOG_FORMAT: {err}"),
        }
    }
}

/// The SQLite URL to connect to: `database.url` if set, else a file in `data_dir`.
pub fn database_url(config: &AppConfig, data_dir: &Path) -> String {
    config
        .database
        .url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.context.max_history_messages, 10);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 8080

[retrieval]
top_k = 5

[context]
max_history_messages = 6
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.context.max_history_messages, 6);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn env_overrides_replace_values() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("MEDIBOT_PORT", "9000"),
                ("MEDIBOT_PUBLIC_URL", "https://medibot.example"),
                ("SECRET_KEY", "s3cret"),
                ("GOOGLE_CLIENT_ID", "cid"),
                ("OPENROUTER_API_KEY", "sk-or"),
                ("PINECONE_INDEX_HOST", "idx.svc.pinecone.io"),
                ("MEDIBOT_LOG_FORMAT", "json"),
            ]),
        );

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_url, "https://medibot.example");
        assert_eq!(
            config.auth.secret_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
        assert_eq!(config.auth.google_client_id.as_deref(), Some("cid"));
        assert!(config.llm.api_key.is_some());
        assert_eq!(config.retrieval.index_host.as_deref(), Some("idx.svc.pinecone.io"));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn env_overrides_ignore_empty_and_invalid() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("MEDIBOT_PORT", "not-a-port"), ("LLM_MODEL", "  ")]),
        );
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.llm.model, AppConfig::default().llm.model);
    }

    #[test]
    fn database_url_prefers_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        assert!(database_url(&config, tmp.path()).ends_with("medibot.db?mode=rwc"));

        config.database.url = Some("sqlite::memory:".to_string());
        assert_eq!(database_url(&config, tmp.path()), "sqlite::memory:");
    }
}
