//! Profile configuration
//!
//! Profiles live in a TOML file and carry the management-plane endpoint and
//! API token. Environment variables override the file: `DOCDBCTL_API_URL`
//! and `DOCDBCTL_API_TOKEN` form a synthetic profile, `DOCDBCTL_PROFILE`
//! selects a named one.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ENV_API_URL: &str = "DOCDBCTL_API_URL";
pub const ENV_API_TOKEN: &str = "DOCDBCTL_API_TOKEN";
pub const ENV_PROFILE: &str = "DOCDBCTL_PROFILE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("profile '{0}' not found in configuration")]
    ProfileNotFound(String),

    #[error(
        "no endpoint configured; pass --api-url, set {ENV_API_URL}, or add a profile to the config file"
    )]
    NoEndpoint,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A named connection profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

/// On-disk configuration: named profiles plus an optional default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Default config path, `~/.config/docdbctl/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "docdbctl", "docdbctl")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the default location; a missing file yields an empty config.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
        Ok(config)
    }

    /// Resolve the profile to use: explicit name, then `DOCDBCTL_PROFILE`,
    /// then the configured default, then environment-variable overrides.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<Profile> {
        let env_profile = std::env::var(ENV_PROFILE).ok();
        let selected = name
            .map(str::to_string)
            .or(env_profile)
            .or_else(|| self.default_profile.clone());

        if let Some(name) = selected {
            return self
                .profiles
                .get(&name)
                .cloned()
                .ok_or(ConfigError::ProfileNotFound(name));
        }

        if let Ok(api_url) = std::env::var(ENV_API_URL) {
            return Ok(Profile {
                api_url,
                api_token: std::env::var(ENV_API_TOKEN).ok(),
            });
        }

        Err(ConfigError::NoEndpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_profiles_from_toml() {
        let (_dir, path) = write_config(
            r#"
default_profile = "staging"

[profiles.staging]
api_url = "https://staging.mgmt.example.com"
api_token = "tok"

[profiles.prod]
api_url = "https://mgmt.example.com"
"#,
        );
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.profiles.len(), 2);
        let profile = config.resolve_profile(None).unwrap();
        assert_eq!(profile.api_url, "https://staging.mgmt.example.com");
        assert_eq!(profile.api_token.as_deref(), Some("tok"));
    }

    #[test]
    fn explicit_profile_wins_over_default() {
        let (_dir, path) = write_config(
            r#"
default_profile = "staging"

[profiles.staging]
api_url = "https://staging.mgmt.example.com"

[profiles.prod]
api_url = "https://mgmt.example.com"
"#,
        );
        let config = Config::load_from_path(&path).unwrap();
        let profile = config.resolve_profile(Some("prod")).unwrap();
        assert_eq!(profile.api_url, "https://mgmt.example.com");
    }

    #[test]
    fn unknown_profile_is_reported() {
        let config = Config::default();
        assert!(matches!(
            config.resolve_profile(Some("nope")),
            Err(ConfigError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn parse_error_names_the_file() {
        let (_dir, path) = write_config("not [valid toml");
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
