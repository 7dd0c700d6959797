use core::fmt::{Debug, Display};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_ENV: &str = "SCHMATCH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "schmatch.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding instance-local state such as the database file.
    pub instance_path: PathBuf,
    pub database_name: String,
    /// Overrides `instance_path/database_name` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    pub listen_address: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance_path: PathBuf::from("instance"),
            database_name: "schmatch.db".to_owned(),
            database_path: None,
            listen_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5000)),
        }
    }
}

impl Config {
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.instance_path.join(&self.database_name))
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

pub fn figment() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(Env::var_or(CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE)))
        .merge(Env::prefixed("SCHMATCH_").ignore(&["config"]))
}

pub fn get_config() -> Result<Config, ConfigError> {
    Ok(figment().extract()?)
}
