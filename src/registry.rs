// src/registry.rs
//! Source registry: the static list of feeds polled by a run.
//!
//! Lookup order:
//! 1) $NEWS_SOURCES_PATH
//! 2) config/sources.toml
//! 3) config/sources.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const ENV_SOURCES_PATH: &str = "NEWS_SOURCES_PATH";
pub const DEFAULT_SOURCES_TOML: &str = "config/sources.toml";
pub const DEFAULT_SOURCES_JSON: &str = "config/sources.json";

fn default_region() -> String {
    "GLOBAL".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    /// Region tag, e.g. "VN" or "GLOBAL".
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the configured source weight for this source.
    #[serde(default)]
    pub weight: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RegistryDoc {
    #[serde(default)]
    sources: Vec<FeedSource>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonRegistry {
    Wrapped(RegistryDoc),
    Bare(Vec<FeedSource>),
}

/// Load the registry from an explicit path. Format follows the extension (`.json` or TOML).
pub fn load_registry_from(path: &Path) -> Result<Vec<FeedSource>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let sources = if ext == "json" {
        match serde_json::from_str::<JsonRegistry>(&content) {
            Ok(JsonRegistry::Wrapped(doc)) => doc.sources,
            Ok(JsonRegistry::Bare(v)) => v,
            Err(source) => {
                return Err(ConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    } else {
        toml::from_str::<RegistryDoc>(&content)
            .map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
            .sources
    };

    clean_sources(sources)
}

/// Load the registry using env var + fallbacks. Finding no registry at all is an error.
pub fn load_registry_default() -> Result<Vec<FeedSource>, ConfigError> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_registry_from(&pb);
        }
        return Err(ConfigError::MissingEnvPath {
            var: ENV_SOURCES_PATH,
            path: pb,
        });
    }
    for candidate in [DEFAULT_SOURCES_TOML, DEFAULT_SOURCES_JSON] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_registry_from(&pb);
        }
    }
    Err(ConfigError::NoRegistry(format!(
        "${ENV_SOURCES_PATH}, {DEFAULT_SOURCES_TOML}, {DEFAULT_SOURCES_JSON}"
    )))
}

/// Trim fields, reject blanks, keep the first of duplicate names (configured order is kept).
fn clean_sources(items: Vec<FeedSource>) -> Result<Vec<FeedSource>, ConfigError> {
    let mut out: Vec<FeedSource> = Vec::with_capacity(items.len());
    for (idx, mut s) in items.into_iter().enumerate() {
        s.name = s.name.trim().to_string();
        s.url = s.url.trim().to_string();
        s.region = s.region.trim().to_string();
        if s.name.is_empty() || s.url.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "source #{idx} needs both name and url"
            )));
        }
        if out.iter().any(|o| o.name.eq_ignore_ascii_case(&s.name)) {
            tracing::warn!(source = %s.name, "duplicate source name in registry, keeping first");
            continue;
        }
        out.push(s);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_and_json_layouts_parse() {
        let dir = tempfile::tempdir().unwrap();

        let p_toml = dir.path().join("sources.toml");
        fs::write(
            &p_toml,
            r#"
[[sources]]
name = " VnExpress "
url = "https://vnexpress.net/rss/so-hoa.rss"
region = "VN"
weight = 2

[[sources]]
name = "The Verge AI"
url = "https://www.theverge.com/rss/ai/index.xml"
"#,
        )
        .unwrap();
        let v = load_registry_from(&p_toml).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].name, "VnExpress");
        assert_eq!(v[0].weight, Some(2));
        assert_eq!(v[1].region, "GLOBAL");

        let p_json = dir.path().join("sources.json");
        fs::write(
            &p_json,
            r#"[{"name":"Genk","url":"https://genk.vn/rss/ai.rss","region":"VN"}]"#,
        )
        .unwrap();
        let vj = load_registry_from(&p_json).unwrap();
        assert_eq!(vj[0].name, "Genk");

        let p_wrapped = dir.path().join("wrapped.json");
        fs::write(&p_wrapped, r#"{"sources": []}"#).unwrap();
        assert!(load_registry_from(&p_wrapped).unwrap().is_empty());
    }

    #[test]
    fn duplicates_keep_first_and_blanks_are_rejected() {
        let dupes = vec![
            FeedSource {
                name: "A".into(),
                url: "u1".into(),
                region: "VN".into(),
                weight: None,
            },
            FeedSource {
                name: "a".into(),
                url: "u2".into(),
                region: "GLOBAL".into(),
                weight: None,
            },
        ];
        let out = clean_sources(dupes).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "u1");

        let blank = vec![FeedSource {
            name: " ".into(),
            url: "u".into(),
            region: "VN".into(),
            weight: None,
        }];
        assert!(matches!(clean_sources(blank), Err(ConfigError::Invalid(_))));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_SOURCES_PATH);

        // Nothing anywhere → error
        assert!(matches!(
            load_registry_default(),
            Err(ConfigError::NoRegistry(_))
        ));

        // Fallback TOML in ./config/
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join(DEFAULT_SOURCES_TOML),
            "[[sources]]\nname = \"X\"\nurl = \"https://x.test/rss\"\n",
        )
        .unwrap();
        assert_eq!(load_registry_default().unwrap()[0].name, "X");

        // Env wins; a dangling env path is an error
        env::set_var(ENV_SOURCES_PATH, tmp.path().join("nope.toml"));
        assert!(matches!(
            load_registry_default(),
            Err(ConfigError::MissingEnvPath { .. })
        ));
        env::remove_var(ENV_SOURCES_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
