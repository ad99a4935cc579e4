// src/config/oracle.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::error::ConfigError;

pub const ENV_ORACLE_CONFIG_PATH: &str = "ORACLE_CONFIG_PATH";
pub const DEFAULT_ORACLE_CONFIG_PATH: &str = "config/oracle.json";

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub enabled: bool,
    /// "openai" (case-insensitive)
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Hard cap on real oracle calls in one run; unlimited when absent.
    #[serde(default)]
    pub max_calls_per_run: Option<u32>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            model: default_model(),
            api_key: String::new(),
            max_calls_per_run: None,
        }
    }
}

impl OracleConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: OracleConfig =
            serde_json::from_str(&data).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"
        if cfg.enabled && cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY").map_err(|_| {
                    ConfigError::Invalid("missing OPENAI_API_KEY env var".to_string())
                })?,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "unsupported oracle provider: {other}"
                    )))
                }
            };
        }

        Ok(cfg)
    }

    /// $ORACLE_CONFIG_PATH, else config/oracle.json, else disabled.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = env::var(ENV_ORACLE_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::MissingEnvPath {
                    var: ENV_ORACLE_CONFIG_PATH,
                    path: pb,
                });
            }
            return Self::load_from_file(&pb);
        }
        let pb = PathBuf::from(DEFAULT_ORACLE_CONFIG_PATH);
        if pb.exists() {
            return Self::load_from_file(&pb);
        }
        tracing::warn!("no oracle config found; enrichment disabled, new entries will be skipped");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_key_is_resolved_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("oracle.json");
        fs::write(
            &p,
            r#"{"enabled": true, "provider": "OpenAI", "api_key": "ENV", "max_calls_per_run": 40}"#,
        )
        .unwrap();

        env::set_var("OPENAI_API_KEY", "sk-test");
        let cfg = OracleConfig::load_from_file(&p).unwrap();
        env::remove_var("OPENAI_API_KEY");

        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.max_calls_per_run, Some(40));
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_key_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("oracle.json");
        fs::write(&p, r#"{"enabled": true, "provider": "openai", "api_key": "env"}"#).unwrap();
        env::remove_var("OPENAI_API_KEY");
        assert!(matches!(
            OracleConfig::load_from_file(&p),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn disabled_config_skips_key_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("oracle.json");
        fs::write(&p, r#"{"enabled": false, "provider": "claude", "api_key": "ENV"}"#).unwrap();
        let cfg = OracleConfig::load_from_file(&p).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.api_key, "ENV");
    }
}
