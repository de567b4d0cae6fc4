// src/config.rs
// =============================================================================
// This file loads the settings the tool needs before it can walk anything:
// which repository, which token, how many downloads at once.
//
// Sources, lowest priority first (later ones win):
//   1. Built-in defaults
//   2. appsettings.json in the working directory (optional)
//   3. repo-letters.toml in the working directory (optional)
//   4. A file passed with --config (must exist)
//   5. GITHUB_TOKEN
//   6. REPO_LETTERS_* environment variables, `__` separating sections
//      e.g. REPO_LETTERS_GITHUB__OWNER=lodash
//   7. Command-line flags (applied by main.rs)
//
// Rust concepts:
// - figment: merges many sources into one struct
// - #[serde(default)]: missing fields fall back to Default
// =============================================================================

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use figment::providers::{Env, Format, Json, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::github::DEFAULT_API_URL;
use crate::walker::{default_suffixes, DEFAULT_MAX_CONCURRENCY};

pub const ENV_PREFIX: &str = "REPO_LETTERS_";

const JSON_SETTINGS: &str = "appsettings.json";
const TOML_SETTINGS: &str = "repo-letters.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub github: GithubSettings,
    pub walker: WalkerSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    pub api_url: String,
}

// No default repository: it has to come from a file, the environment or a flag
impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerSettings {
    pub max_concurrency: usize,
    pub suffixes: Vec<String>,
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            suffixes: default_suffixes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when RUST_LOG is unset, e.g. "info" or "repo_letters=debug"
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads and merges every configuration source.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(explicit)?;
        figment.extract().context("Invalid configuration")
    }

    fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Json::file(JSON_SETTINGS))
            .merge(Toml::file(TOML_SETTINGS));

        if let Some(path) = explicit {
            if !path.is_file() {
                bail!("Config file '{}' does not exist", path.display());
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        Ok(figment
            .merge(Env::raw().filter_map(|key| {
                key.as_str()
                    .eq_ignore_ascii_case("GITHUB_TOKEN")
                    .then(|| "github.token".into())
            }))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// The token, if one is set and not blank.
    pub fn token(&self) -> Option<&str> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Rejects settings the walk cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.github.owner.trim().is_empty(),
            "github.owner must be set (appsettings.json, {}GITHUB__OWNER, --owner or --repo-url)",
            ENV_PREFIX
        );
        ensure!(
            !self.github.repo.trim().is_empty(),
            "github.repo must be set (appsettings.json, {}GITHUB__REPO, --repo or --repo-url)",
            ENV_PREFIX
        );
        ensure!(
            self.walker.max_concurrency >= 1,
            "walker.max_concurrency must be at least 1"
        );
        ensure!(
            self.walker.suffixes.iter().any(|s| !s.is_empty()),
            "walker.suffixes must name at least one file ending"
        );
        Url::parse(&self.github.api_url)
            .with_context(|| format!("github.api_url '{}' is not a URL", self.github.api_url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    // Defaults plus a repository, i.e. the smallest config that validates
    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.github.owner = "lodash".to_string();
        config.github.repo = "lodash".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.walker.max_concurrency, 100);
        assert_eq!(config.walker.suffixes, vec![".js", ".ts"]);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.github.owner.is_empty());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_nothing_configured_is_fatal() {
        Jail::expect_with(|_| {
            let config = AppConfig::load(None).map_err(|e| e.to_string())?;
            assert!(config.github.owner.is_empty());
            assert!(config.github.repo.is_empty());

            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("github.owner must be set"));
            Ok(())
        });
    }

    #[test]
    fn test_env_alone_can_supply_repository() {
        Jail::expect_with(|jail| {
            jail.set_env("REPO_LETTERS_GITHUB__OWNER", "octo");
            jail.set_env("REPO_LETTERS_GITHUB__REPO", "hello");

            let config = AppConfig::load(None).map_err(|e| e.to_string())?;
            assert!(config.validate().is_ok());
            assert_eq!(config.github.repo, "hello");
            Ok(())
        });
    }

    #[test]
    fn test_json_file_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "appsettings.json",
                r#"{ "github": { "owner": "octo", "repo": "hello", "token": "from-file" } }"#,
            )?;
            jail.set_env("REPO_LETTERS_GITHUB__TOKEN", "from-env");
            jail.set_env("REPO_LETTERS_WALKER__MAX_CONCURRENCY", "8");

            let config = AppConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.github.owner, "octo");
            assert_eq!(config.github.repo, "hello");
            assert_eq!(config.token(), Some("from-env"));
            assert_eq!(config.walker.max_concurrency, 8);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [github]
                owner = "rust-lang"
                repo = "rust"

                [walker]
                suffixes = [".rs"]
                "#,
            )?;

            let config =
                AppConfig::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.github.owner, "rust-lang");
            assert_eq!(config.walker.suffixes, vec![".rs"]);
            // untouched sections keep their defaults
            assert_eq!(config.walker.max_concurrency, 100);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        Jail::expect_with(|_| {
            assert!(AppConfig::load(Some(Path::new("nope.toml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = valid();
        config.github.repo = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.walker.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.walker.suffixes.clear();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.github.api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_token_is_none() {
        let mut config = AppConfig::default();
        config.github.token = Some("   ".to_string());
        assert_eq!(config.token(), None);
    }
}
