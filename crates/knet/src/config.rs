//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. global file: `<config dir>/knet/config.toml`
//! 2. environment: `KNET_*` variables
//! 3. project file: `.knet/config.toml` in the working directory
//!
//! Layers are merged table by table, so a project file that only sets
//! `[session] project` keeps the gateway settings from the global file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use knet_core::Uuid;
use knet_gateway::HttpConfig;
use knet_store::{DEFAULT_CAPACITY, DEFAULT_TAG_TTL_SECS};

use crate::error::{KnetError, Result};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "KNET_";

/// Directory name under the platform config dir and in projects.
pub const APP_DIR: &str = "knet";

/// Project-local config location, relative to the working directory.
pub const PROJECT_CONFIG: &str = ".knet/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Who this adapter signs as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<Uuid>,
    /// Base64 Ed25519 seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Base64 Ed25519 public key; checked against `private_key` when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Hub used to qualify addresses of entities not yet seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_host: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            token: None,
            hub_host: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    /// HTTP client settings.
    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.url.clone(),
            token: self.token.clone(),
            timeout: std::time::Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Current project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Uuid>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_tag_ttl")]
    pub tag_ttl_secs: i64,
    /// Session state file; in-memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            project: None,
            cache_capacity: default_cache_capacity(),
            tag_ttl_secs: default_tag_ttl(),
            state_file: None,
        }
    }
}

fn default_gateway_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_tag_ttl() -> i64 {
    DEFAULT_TAG_TTL_SECS
}

impl Config {
    /// Read a single TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Write as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// A loaded configuration and where updates should be written.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Project file if one is configured, else the global file.
    pub write_path: Option<PathBuf>,
}

/// Builds a [`Config`] from files and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    global: Option<PathBuf>,
    project: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl ConfigLoader {
    /// Standard locations and the process environment.
    pub fn from_environment() -> Self {
        Self {
            global: dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml")),
            project: std::env::current_dir().ok().map(|d| d.join(PROJECT_CONFIG)),
            env: std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)).collect(),
        }
    }

    pub fn with_global(mut self, path: impl Into<PathBuf>) -> Self {
        self.global = Some(path.into());
        self
    }

    pub fn with_project(mut self, path: impl Into<PathBuf>) -> Self {
        self.project = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Merge all layers. Missing files are skipped.
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut merged = Table::new();
        if let Some(path) = &self.global {
            merge(&mut merged, read_layer(path)?);
        }
        merge(&mut merged, env_layer(&self.env)?);
        let project_exists = self.project.as_deref().is_some_and(Path::exists);
        if let Some(path) = &self.project {
            merge(&mut merged, read_layer(path)?);
        }

        let config: Config = Value::Table(merged).try_into()?;
        let write_path = if project_exists {
            self.project.clone()
        } else {
            self.global.clone()
        };
        tracing::debug!(write_path = ?write_path, "configuration loaded");
        Ok(LoadedConfig { config, write_path })
    }
}

fn read_layer(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Ok(Table::new());
    }
    let raw = fs::read_to_string(path)?;
    Ok(raw.parse::<Table>()?)
}

/// `KNET_*` variables as a config table.
fn env_layer(env: &HashMap<String, String>) -> Result<Table> {
    let mut layer = Table::new();
    let mut set = |section: &str, key: &str, value: Value| {
        let entry = layer
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if let Value::Table(t) = entry {
            t.insert(key.to_string(), value);
        }
    };

    for (name, raw) in env {
        let Some(var) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let text = || Value::String(raw.clone());
        match var {
            "AGENT_ID" => set("identity", "agent_id", text()),
            "PRIVATE_KEY" => set("identity", "private_key", text()),
            "PUBLIC_KEY" => set("identity", "public_key", text()),
            "GATEWAY_URL" => set("gateway", "url", text()),
            "GATEWAY_TOKEN" => set("gateway", "token", text()),
            "HUB_HOST" => set("gateway", "hub_host", text()),
            "TIMEOUT_SECS" => set("gateway", "timeout_secs", integer(name, raw)?),
            "PROJECT" => set("session", "project", text()),
            "CACHE_CAPACITY" => set("session", "cache_capacity", integer(name, raw)?),
            "STATE_FILE" => set("session", "state_file", text()),
            _ => tracing::debug!(variable = %name, "ignoring unknown environment variable"),
        }
    }
    Ok(layer)
}

fn integer(name: &str, raw: &str) -> Result<Value> {
    raw.trim()
        .parse::<u32>()
        .map(|n| Value::Integer(i64::from(n)))
        .map_err(|_| KnetError::Config(format!("{name} must be a non-negative integer, got {raw:?}")))
}

/// Deep-merge `overlay` into `base`; overlay wins on conflicts.
fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => merge(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let loaded = ConfigLoader::default().load().unwrap();
        assert_eq!(loaded.config, Config::default());
        assert_eq!(loaded.config.gateway.timeout_secs, 30);
        assert_eq!(loaded.config.session.cache_capacity, DEFAULT_CAPACITY);
        assert!(loaded.write_path.is_none());
    }

    #[test]
    fn test_layer_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project/.knet/config.toml");
        fs::write(
            &global,
            "[gateway]\nurl = \"https://global:1\"\ntoken = \"g\"\ntimeout_secs = 5\n",
        )
        .unwrap();
        fs::create_dir_all(project.parent().unwrap()).unwrap();
        fs::write(&project, "[gateway]\nurl = \"https://project:3\"\n").unwrap();

        let loaded = ConfigLoader::default()
            .with_global(&global)
            .with_project(&project)
            .with_env(env(&[
                ("KNET_GATEWAY_URL", "https://env:2"),
                ("KNET_GATEWAY_TOKEN", "e"),
            ]))
            .load()
            .unwrap();

        let gateway = &loaded.config.gateway;
        assert_eq!(gateway.url, "https://project:3");
        assert_eq!(gateway.token.as_deref(), Some("e"));
        assert_eq!(gateway.timeout_secs, 5);
        assert_eq!(loaded.write_path.as_deref(), Some(project.as_path()));
    }

    #[test]
    fn test_env_typed_values() {
        let project = Uuid::new_v4();
        let loaded = ConfigLoader::default()
            .with_env(env(&[
                ("KNET_PROJECT", &project.to_string()),
                ("KNET_CACHE_CAPACITY", "42"),
                ("KNET_TIMEOUT_SECS", "7"),
                ("KNET_UNRELATED", "x"),
            ]))
            .load()
            .unwrap();
        assert_eq!(loaded.config.session.project, Some(project));
        assert_eq!(loaded.config.session.cache_capacity, 42);
        assert_eq!(loaded.config.gateway.timeout_secs, 7);
    }

    #[test]
    fn test_bad_env_value() {
        let err = ConfigLoader::default()
            .with_env(env(&[("KNET_CACHE_CAPACITY", "lots")]))
            .load()
            .unwrap_err();
        assert!(matches!(err, KnetError::Config(_)));
    }

    #[test]
    fn test_bad_uuid_rejected() {
        let result = ConfigLoader::default()
            .with_env(env(&[("KNET_AGENT_ID", "not-a-uuid")]))
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_write_falls_back_to_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let loaded = ConfigLoader::default()
            .with_global(&global)
            .with_project(dir.path().join("missing/config.toml"))
            .load()
            .unwrap();
        assert_eq!(loaded.write_path.as_deref(), Some(global.as_path()));
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.identity.agent_id = Some(Uuid::new_v4());
        config.gateway.hub_host = Some("hub:443".into());
        config.save(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }
}
