use std::{path::Path, time::Duration};

use anyhow::{anyhow, Result};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Configuration for the admin tool. Everything here is read-only for the
/// lifetime of a command invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminToolConfig {
    /// Name of the cluster whose metadata tree is consulted.
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Total number of segment containers in the cluster. Container ids are
    /// dense in [0, container_count).
    #[serde(default = "default_container_count")]
    pub container_count: u32,

    /// Privileged RPC port exposed by every segment store node, distinct from
    /// the data-path port. Uniform across the cluster.
    #[serde(default = "default_admin_gateway_port")]
    pub admin_gateway_port: u16,

    /// Coordination service (etcd) endpoints.
    #[serde(default = "default_metadata_addresses")]
    pub metadata_addresses: Vec<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub thread_pool: ThreadPoolConfig,
}

impl Default for AdminToolConfig {
    fn default() -> Self {
        AdminToolConfig {
            cluster_name: default_cluster_name(),
            container_count: default_container_count(),
            admin_gateway_port: default_admin_gateway_port(),
            metadata_addresses: default_metadata_addresses(),
            connect_timeout_ms: default_connect_timeout_ms(),
            auth: AuthConfig::default(),
            thread_pool: ThreadPoolConfig::default(),
        }
    }
}

impl AdminToolConfig {
    pub fn from_path(path: &Path) -> Result<AdminToolConfig> {
        let config_str = std::fs::read_to_string(path)?;
        let config: AdminToolConfig = Figment::new().merge(Yaml::string(&config_str)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() {
            return Err(anyhow!("cluster_name must not be empty"));
        }
        if self.container_count == 0 {
            return Err(anyhow!("container_count must be at least 1"));
        }
        if self.admin_gateway_port == 0 {
            return Err(anyhow!("admin_gateway_port must not be 0"));
        }
        if self.metadata_addresses.is_empty() {
            return Err(anyhow!("at least one metadata address is required"));
        }
        self.thread_pool.validate()?;
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Credentials from which the master token for privileged RPCs is derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Explicit master token. Takes precedence over username/password.
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Thread-pool sizing record, interpreted by the runtime factory below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadPoolConfig {
    /// The minimum number of threads in the pool.
    pub core_pool_size: usize,

    /// The maximum number of threads in the pool.
    pub max_pool_size: usize,

    /// How long excess idle threads wait before terminating.
    #[serde(default = "default_keep_alive_time")]
    pub keep_alive_time: u64,

    #[serde(default)]
    pub time_unit: TimeUnit,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        ThreadPoolConfig {
            core_pool_size: 2,
            max_pool_size: 8,
            keep_alive_time: default_keep_alive_time(),
            time_unit: TimeUnit::default(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
}

impl ThreadPoolConfig {
    pub fn keep_alive(&self) -> Duration {
        match self.time_unit {
            TimeUnit::Milliseconds => Duration::from_millis(self.keep_alive_time),
            TimeUnit::Seconds => Duration::from_secs(self.keep_alive_time),
            TimeUnit::Minutes => Duration::from_secs(self.keep_alive_time * 60),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.core_pool_size == 0 {
            return Err(anyhow!("thread_pool.core_pool_size must be at least 1"));
        }
        if self.max_pool_size < self.core_pool_size {
            return Err(anyhow!(
                "thread_pool.max_pool_size must be >= core_pool_size"
            ));
        }
        Ok(())
    }

    pub fn build_runtime(&self) -> Result<tokio::runtime::Runtime> {
        self.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.core_pool_size)
            .max_blocking_threads(self.max_pool_size)
            .thread_keep_alive(self.keep_alive())
            .thread_name("streamvault-admin")
            .enable_all()
            .build()?;
        Ok(runtime)
    }
}

fn default_cluster_name() -> String {
    "streamvault".to_string()
}

fn default_container_count() -> u32 {
    4
}

fn default_admin_gateway_port() -> u16 {
    9999
}

fn default_metadata_addresses() -> Vec<String> {
    vec!["localhost:2379".to_string()]
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_keep_alive_time() -> u64 {
    100
}
