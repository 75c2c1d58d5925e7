//! Warehouse connection configuration.

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use etl_core::ClusterConfig;

fn default_connect_timeout_secs() -> u64 {
    30
}

/// Connection settings for one warehouse session.
#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Seconds to wait for the connection to open
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Refuse to fall back to an unencrypted session
    #[serde(default)]
    pub require_tls: bool,
}

impl WarehouseConfig {
    /// Settings for a validated `[CLUSTER]` section.
    pub fn from_cluster(cluster: &ClusterConfig, connect_timeout_secs: u64) -> Self {
        Self {
            host: cluster.host.clone(),
            port: cluster.db_port,
            database: cluster.db_name.clone(),
            username: cluster.db_user.clone(),
            password: cluster.db_password.clone(),
            connect_timeout_secs,
            require_tls: cluster.require_tls,
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_tls {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(ssl_mode)
            .application_name("songplay-etl")
    }
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("require_tls", &self.require_tls)
            .finish()
    }
}
