//! Assembles a [`BankService`] from site configuration.

use std::{path::Path, sync::Arc};

use bank_config::{Config, PolicyConfig};
use bank_core::{
    AllocationEngine, AllocationPolicy, BankService, Clock, Collaborators, NoticeTemplate,
};
use bank_storage_json::JsonLedgerStore;
use chrono::{DateTime, Utc};

use crate::{
    action_log::FileActionLog,
    errors::CliError,
    notify::SendmailNotifier,
    slurm::{CommandRunner, ProcessRunner, SlurmActuator, SlurmDirectory, SlurmUsage},
};

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn policy_from_config(policy: &PolicyConfig) -> AllocationPolicy {
    AllocationPolicy {
        min_grant: policy.min_grant,
        default_grant: policy.default_grant,
        near_limit_percent: policy.near_limit_percent,
        period_days: policy.period_days,
        pre_expiry_days: policy.pre_expiry_days,
    }
}

/// Opens (and locks) the ledger and wires the Slurm and mail collaborators.
pub fn build_service(config: &Config, home: &Path) -> Result<BankService, CliError> {
    config.validate()?;
    let store = JsonLedgerStore::with_retention(
        config.resolve_ledger_path(home),
        config.backup_retention,
    )?;
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    let slurm = &config.slurm;
    let mail = &config.notifications;

    let collaborators = Collaborators {
        usage: Arc::new(SlurmUsage::new(runner.clone(), slurm.sshare_path.clone())),
        actuator: Arc::new(SlurmActuator::new(runner.clone(), slurm.sacctmgr_path.clone())),
        directory: Arc::new(SlurmDirectory::new(
            runner.clone(),
            slurm.sacctmgr_path.clone(),
            mail.mail_domain.clone(),
        )),
        notifier: Arc::new(SendmailNotifier::new(
            runner,
            mail.sendmail_path.clone(),
            mail.sender.clone(),
        )),
        action_log: Arc::new(FileActionLog::new(config.resolve_log_file(home))),
    };
    let template = NoticeTemplate {
        site_name: mail.site_name.clone(),
        signature: mail.signature.clone(),
        default_grant: config.policy.default_grant,
    };

    Ok(BankService::new(
        AllocationEngine::new(policy_from_config(&config.policy)),
        Arc::new(store),
        Arc::new(SystemClock),
        config.clusters.clone(),
        collaborators,
        template,
    ))
}
