use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the PostgreSQL connection string.
pub const SOURCE_URL_ENV: &str = "pgConnectionString";
/// Environment variable holding the MongoDB connection string.
pub const STORE_URL_ENV: &str = "mongoConnectionString";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub etl: EtlConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            database: default_database(),
        }
    }
}

fn default_database() -> String {
    "jjba_wiki".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EtlConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub keep_going: bool,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            keep_going: false,
        }
    }
}

fn default_concurrency() -> usize {
    8
}

impl SourceConfig {
    /// The PostgreSQL connection string, or an error naming the variable
    /// that should provide it.
    pub fn url(&self) -> Result<&str> {
        non_empty(&self.url).ok_or_else(|| anyhow!("{} is not set", SOURCE_URL_ENV))
    }
}

impl StoreConfig {
    /// The MongoDB connection string, or an error naming the variable that
    /// should provide it.
    pub fn url(&self) -> Result<&str> {
        non_empty(&self.url).ok_or_else(|| anyhow!("{} is not set", STORE_URL_ENV))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Loads configuration from `path` (defaults when the file does not exist),
/// then applies connection strings from the process environment.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

/// Environment values win over the file.
fn apply_env(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(SOURCE_URL_ENV) {
        config.source.url = Some(url);
    }
    if let Some(url) = lookup(STORE_URL_ENV) {
        config.store.url = Some(url);
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.etl.concurrency == 0 {
        anyhow::bail!("etl.concurrency must be >= 1");
    }
    if config.source.max_connections == 0 {
        anyhow::bail!("source.max_connections must be >= 1");
    }
    if config.store.database.trim().is_empty() {
        anyhow::bail!("store.database must not be empty");
    }
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    Ok(())
}
