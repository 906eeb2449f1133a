use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use redact::Secret;
use serde::Deserialize;

/// Which [`Store`](crate::store::Store) backs the data routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mysql,
    Memory,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database_url")]
    pub database_url: Secret<String>,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Seconds to wait for the database before starting without it.
    #[serde(default = "default_database_connect_timeout_secs")]
    pub database_connect_timeout_secs: u64,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,

    #[serde(default)]
    pub store: StoreKind,

    #[serde(default)]
    pub openai_api_key: Option<Secret<String>>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default)]
    pub openai_instructions: Option<String>,

    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

impl Config {
    pub const fn database_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database_connect_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            database_max_connections: default_database_max_connections(),
            database_connect_timeout_secs:
                default_database_connect_timeout_secs(),
            run_migrations: default_run_migrations(),
            store: StoreKind::default(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_instructions: None,
            public_dir: default_public_dir(),
        }
    }
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    3000
}

fn default_database_url() -> Secret<String> {
    Secret::new("mysql://root@localhost:3306/beatbuddy".to_string())
}

const fn default_database_max_connections() -> u32 {
    1
}

const fn default_database_connect_timeout_secs() -> u64 {
    5
}

const fn default_run_migrations() -> bool {
    true
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.database_max_connections, 1);
        assert_eq!(config.database_connect_timeout(), Duration::from_secs(5));
        assert!(config.run_migrations);
        assert_eq!(config.store, StoreKind::Mysql);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_overrides() {
        let config: Config = serde_json::from_value(json!({
            "port": 8080,
            "store": "memory",
            "openai_api_key": "sk-test",
            "openai_instructions": "You recommend music.",
        }))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(
            config.openai_api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("sk-test")
        );
        assert_eq!(
            config.openai_instructions.as_deref(),
            Some("You recommend music.")
        );
    }

    #[test]
    fn test_secrets_are_redacted_in_debug_output() {
        let config: Config = serde_json::from_value(json!({
            "openai_api_key": "sk-very-secret",
        }))
        .unwrap();

        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }
}
