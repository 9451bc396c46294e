use anyhow::{bail, Context};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use std::{env, fs, path::Path};

use crate::core::QueueManagerConfig;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SIMPLEBROKER_CONFIG";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Used for GET requests without a `timeout` parameter.
    pub default_timeout_secs: u64,
    /// How long in-flight HTTP requests get to finish on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            default_timeout_secs: 5,
            shutdown_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    pub max_queue_num: usize,
    pub max_messages_per_queue: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let limits = QueueManagerConfig::default();
        Self {
            max_queue_num: limits.max_queue_num,
            max_messages_per_queue: limits.max_messages_per_queue,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub queues: QueueConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub default_timeout_secs: Option<u64>,
    pub max_queue_num: Option<usize>,
    pub max_messages_per_queue: Option<usize>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.as_ref().display()))?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}

/// Loads the file named by `path`, else by [`CONFIG_ENV`], else returns defaults.
pub fn resolve_config(path: Option<&str>) -> Result<Config, anyhow::Error> {
    let effective = path.map(str::to_string).or_else(|| env::var(CONFIG_ENV).ok());
    match effective {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

impl Config {
    pub fn apply(&mut self, overrides: &Overrides) -> Result<(), anyhow::Error> {
        if let Some(port) = overrides.port {
            let mut addr = self.bind_addr()?;
            addr.set_port(port);
            self.server.bind_addr = addr.to_string();
        }
        if let Some(secs) = overrides.default_timeout_secs {
            self.server.default_timeout_secs = secs;
        }
        if let Some(n) = overrides.max_queue_num {
            self.queues.max_queue_num = n;
        }
        if let Some(n) = overrides.max_messages_per_queue {
            self.queues.max_messages_per_queue = n;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.bind_addr()?;
        if self.server.default_timeout_secs == 0 {
            bail!("server.default_timeout_secs must be positive");
        }
        if self.queues.max_queue_num == 0 {
            bail!("queues.max_queue_num must be positive");
        }
        if self.queues.max_messages_per_queue == 0 {
            bail!("queues.max_messages_per_queue must be positive");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| format!("invalid server.bind_addr {:?}", self.server.bind_addr))
    }

    pub fn queue_manager_config(&self) -> QueueManagerConfig {
        QueueManagerConfig {
            max_queue_num: self.queues.max_queue_num,
            max_messages_per_queue: self.queues.max_messages_per_queue,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.server.default_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}
