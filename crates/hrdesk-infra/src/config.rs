//! Engine configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.hrdesk/` in production)
//! and deserializes it into [`EngineConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use hrdesk_types::config::EngineConfig;

/// Resolve the data directory.
///
/// `HRDESK_DATA_DIR` overrides; the default is `~/.hrdesk`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HRDESK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hrdesk")
}

/// Load engine configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`EngineConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_engine_config(data_dir: &Path) -> EngineConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return EngineConfig::default();
        }
    };

    match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_engine_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.retrieval_k, 8);
    }

    #[tokio::test]
    async fn load_engine_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
model = "llama3.1"
retrieval_k = 5
prompt_budget = 4000
"#,
        )
        .await
        .unwrap();

        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.retrieval_k, 5);
        assert_eq!(config.prompt_budget, 4000);
        // Unspecified fields keep their defaults
        assert_eq!(config.max_tokens, 1200);
    }

    #[tokio::test]
    async fn load_engine_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.retrieval_k, 8);
    }
}
