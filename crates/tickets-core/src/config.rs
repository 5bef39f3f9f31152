use crate::ledger::TicketPolicy;
use crate::store::Rules;
use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TICKETS_CONFIG";

/// Environment variable naming an explicit state file.
pub const STATE_ENV: &str = "TICKETS_STATE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub rules: Rules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot location. Defaults to `<data_dir>/tickets/state.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Events older than this many days are dropped on load. `0` keeps all.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            retention_days: default_retention_days(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn retention(&self) -> Option<TimeDelta> {
        (self.retention_days > 0).then(|| TimeDelta::days(i64::from(self.retention_days)))
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Default config file location: `$TICKETS_CONFIG`, else
/// `<config_dir>/tickets/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("tickets/config.toml"))
}

/// Load the config at `path`. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the config from [`default_config_path`], or defaults when there is
/// no config directory.
pub fn load_user_config() -> Result<Config> {
    default_config_path().map_or_else(|| Ok(Config::default()), |path| load_config(&path))
}

/// Resolve the snapshot path. Precedence: explicit flag, `$TICKETS_STATE`,
/// `[store] path`, `<data_dir>/tickets/state.json`, `./tickets-state.json`.
#[must_use]
pub fn resolve_state_path(cli_path: Option<&Path>, config: &Config) -> PathBuf {
    resolve_state_path_inner(cli_path, env::var(STATE_ENV).ok(), config, dirs::data_dir())
}

fn resolve_state_path_inner(
    cli_path: Option<&Path>,
    env_path: Option<String>,
    config: &Config,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Some(path) = env_path.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.store.path {
        return path.clone();
    }
    data_dir.map_or_else(
        || PathBuf::from("tickets-state.json"),
        |dir| dir.join("tickets/state.json"),
    )
}

/// The template written by `tk init`.
#[must_use]
pub fn config_template() -> String {
    format!(
        "[store]\n\
         retention_days = {}\n\
         lock_timeout_ms = {}\n\
         \n\
         [rules]\n\
         ticket_policy = \"{}\"\n\
         strict = false\n\
         guard_redemptions = false\n",
        default_retention_days(),
        default_lock_timeout_ms(),
        TicketPolicy::default(),
    )
}

const fn default_retention_days() -> u32 {
    7
}

const fn default_lock_timeout_ms() -> u64 {
    2000
}
