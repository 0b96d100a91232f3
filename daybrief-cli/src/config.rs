//! Configuration: ~/.daybrief/config.toml plus environment tokens.
//!
//! API tokens are deliberately env-only so the config file stays safe to
//! commit or share. Missing tokens fail fast with a remediation hint.

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use daybrief_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const TASKSTORE_TOKEN_VAR: &str = "DAYBRIEF_TASKSTORE_TOKEN";
pub const CHAT_TOKEN_VAR: &str = "DAYBRIEF_CHAT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageSection,
    pub schedule: ScheduleSection,
    pub users: UsersSection,
    pub retry: RetrySection,
    pub taskstore: EndpointSection,
    pub chat: EndpointSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Path to the SQLite database; relative paths resolve under ~/.daybrief.
    pub db_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// IANA name used when the chat profile lookup fails.
    pub default_timezone: String,
    /// Local times, "HH:MM".
    pub brief_time: String,
    pub wrap_time: String,
    pub outcomes_time: String,
    pub tolerance_min: i64,
    /// Cap on undated P1 suggestions in the brief plan view.
    pub max_undated_p1: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersSection {
    /// Chat user ids the scheduled jobs loop over.
    pub active: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSection {
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageSection {
                db_file: "daybrief.db".to_string(),
            },
            schedule: ScheduleSection {
                default_timezone: "America/Denver".to_string(),
                brief_time: "08:30".to_string(),
                wrap_time: "18:00".to_string(),
                outcomes_time: "09:00".to_string(),
                tolerance_min: 5,
                max_undated_p1: 15,
            },
            users: UsersSection { active: Vec::new() },
            retry: RetrySection {
                max_attempts: 3,
                base_delay_ms: 100,
                multiplier: 2.0,
            },
            taskstore: EndpointSection {
                base_url: "https://api.taskstore.example/v1".to_string(),
            },
            chat: EndpointSection {
                base_url: "https://chat.example/api".to_string(),
            },
        }
    }
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay_ms: self.retry.base_delay_ms,
            multiplier: self.retry.multiplier,
        }
    }

    pub fn parse_time(s: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(s, "%H:%M").with_context(|| format!("invalid time '{s}'"))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        let p = PathBuf::from(&self.storage.db_file);
        if p.is_absolute() {
            Ok(p)
        } else {
            Ok(ensure_daybrief_home()?.join(p))
        }
    }
}

pub fn daybrief_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".daybrief"))
}

pub fn ensure_daybrief_home() -> Result<PathBuf> {
    let dir = daybrief_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_daybrief_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Required token from the environment; primary credentials never degrade
/// silently.
pub fn require_token(var: &str, service: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!(
            "Missing required configuration: {var}. \
             Export the {service} API token as {var} before running."
        ),
    }
}
