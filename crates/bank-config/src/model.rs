use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

const LEDGER_DIR: &str = "ledger";
const LEDGER_FILE: &str = "crc-bank.json";
const LOG_FILE: &str = "crc-bank.log";

/// Site configuration for one bank installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Clusters whose associations, usage and holds the bank manages.
    #[serde(default = "Config::default_clusters")]
    pub clusters: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Ledger file. Defaults to `<home>/ledger/crc-bank.json`.
    pub ledger_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Action log. Defaults to `<home>/crc-bank.log`.
    pub log_file: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub slurm: SlurmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clusters: Self::default_clusters(),
            ledger_path: None,
            log_file: None,
            backup_retention: Self::default_backup_retention(),
            policy: PolicyConfig::default(),
            notifications: NotificationConfig::default(),
            slurm: SlurmConfig::default(),
        }
    }
}

impl Config {
    pub fn default_clusters() -> Vec<String> {
        vec!["cluster".into()]
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn resolve_ledger_path(&self, home: &Path) -> PathBuf {
        if let Some(path) = &self.ledger_path {
            return path.clone();
        }
        home.join(LEDGER_DIR).join(LEDGER_FILE)
    }

    pub fn resolve_log_file(&self, home: &Path) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        home.join(LOG_FILE)
    }

    /// Rejects settings the bank cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clusters.is_empty() {
            return Err(ConfigError::Invalid("no clusters configured".into()));
        }
        if let Some(blank) = self.clusters.iter().position(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "cluster name at position {blank} is empty"
            )));
        }
        let policy = &self.policy;
        if policy.default_grant < policy.min_grant {
            return Err(ConfigError::Invalid(format!(
                "default_grant ({}) is below min_grant ({})",
                policy.default_grant, policy.min_grant
            )));
        }
        if !(1..=100).contains(&policy.near_limit_percent) {
            return Err(ConfigError::Invalid(format!(
                "near_limit_percent must be between 1 and 100, got {}",
                policy.near_limit_percent
            )));
        }
        if policy.period_days == 0 {
            return Err(ConfigError::Invalid("period_days must be positive".into()));
        }
        Ok(())
    }
}

/// Grant sizes and notification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub min_grant: u64,
    pub default_grant: u64,
    pub near_limit_percent: u64,
    pub period_days: u32,
    pub pre_expiry_days: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_grant: 10_000,
            default_grant: 10_000,
            near_limit_percent: 90,
            period_days: 365,
            pre_expiry_days: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Name used in notice subjects and bodies.
    pub site_name: String,
    pub sender: String,
    /// Appended to the account's description to form the recipient address.
    pub mail_domain: String,
    pub signature: String,
    pub sendmail_path: PathBuf,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            site_name: "cluster".into(),
            sender: "proposal_bot@localhost".into(),
            mail_domain: "localhost".into(),
            signature: "The Proposal Bot".into(),
            sendmail_path: PathBuf::from("/usr/sbin/sendmail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlurmConfig {
    pub sacctmgr_path: PathBuf,
    pub sshare_path: PathBuf,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            sacctmgr_path: PathBuf::from("sacctmgr"),
            sshare_path: PathBuf::from("sshare"),
        }
    }
}
