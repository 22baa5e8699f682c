use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.json";

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("mail2tracks").join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// One address or a list of addresses; normalized to a list on load.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    OneOrMany::deserialize(d).map(Into::into)
}

fn optional_one_or_many<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Option::<OneOrMany>::deserialize(d).map(|v| v.map(Into::into))
}

/// A Tracks installation that inbound emails can be routed to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TracksConfig {
    /// Base URL of the Tracks install, e.g. `http://tracks.example.com/`.
    pub base_url: String,
    pub user: String,
    /// Looked up in the keyring when absent.
    #[serde(default)]
    pub password: Option<String>,
    /// Numeric id of the context used when none (or an unknown one) is given.
    pub default_context: u64,
    /// Substrings searched for in the `To` header to select this target.
    #[serde(deserialize_with = "one_or_many")]
    pub emails: Vec<String>,
    /// Substrings the `From` header must contain; `None` accepts anyone.
    #[serde(default, deserialize_with = "optional_one_or_many")]
    pub froms: Option<Vec<String>>,
    /// Where failures are reported. `None` drops them after logging.
    #[serde(default)]
    pub bounce: Option<String>,
    /// Bounce instead of falling back when a named context/project is unknown.
    #[serde(default, alias = "finiky")]
    pub strict: bool,
}

impl TracksConfig {
    fn validate(&mut self, index: usize) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: format!("targets[{}].base_url", index),
                message: format!("'{}' is not an http(s) URL", base),
            });
        }
        self.base_url = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };

        self.emails.retain(|e| !e.trim().is_empty());
        if self.emails.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: format!("targets[{}].emails", index),
                message: "at least one recipient address is required".into(),
            });
        }
        Ok(())
    }
}

/// SMTP relay used for bounces. Without one, bounces go through `sendmail`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    pub targets: Vec<TracksConfig>,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = serde_json::from_str(json)?;
        if config.targets.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "targets".into(),
                message: "no Tracks targets configured".into(),
            });
        }
        for (i, target) in config.targets.iter_mut().enumerate() {
            target.validate(i)?;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Load from `path`, or the default location when `None`.
    pub fn load_or_default_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load(&default_config_path()?),
        }
    }
}
