use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use bank_core::{
    AccountDirectory, ActionLog, AllocationEngine, AllocationPolicy, BankService,
    CollaboratorError, Collaborators, EnforcementActuator, FixedClock, LedgerEvent,
    MemoryLedgerStore, NoticeTemplate, Notifier, UsageSource,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;

pub static TODAY: Lazy<NaiveDate> = Lazy::new(|| NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

pub const CLUSTERS: &[&str] = &["smp", "gpu"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// In-process stand-in for the scheduler, the account directory and the mailer.
#[derive(Default)]
pub struct FakeCluster {
    usage: Mutex<HashMap<(String, String), u64>>,
    pub commands: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<SentMessage>>,
    pub log: Mutex<Vec<String>>,
    missing: Mutex<HashSet<String>>,
    fail_notify: Mutex<bool>,
}

impl FakeCluster {
    pub fn set_usage_seconds(&self, account: &str, cluster: &str, seconds: u64) {
        self.usage
            .lock()
            .unwrap()
            .insert((account.to_string(), cluster.to_string()), seconds);
    }

    pub fn set_usage_hours(&self, account: &str, hours: u64) {
        self.set_usage_seconds(account, CLUSTERS[0], hours * 3600);
    }

    pub fn remove_association(&self, account: &str) {
        self.missing.lock().unwrap().insert(account.to_string());
    }

    pub fn fail_notifications(&self) {
        *self.fail_notify.lock().unwrap() = true;
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
        self.sent.lock().unwrap().clear();
    }

    fn push(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

impl UsageSource for FakeCluster {
    fn raw_usage(&self, account: &str, cluster: &str) -> Result<u64, CollaboratorError> {
        Ok(self
            .usage
            .lock()
            .unwrap()
            .get(&(account.to_string(), cluster.to_string()))
            .copied()
            .unwrap_or(0))
    }
}

impl EnforcementActuator for FakeCluster {
    fn apply_hold(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError> {
        self.push(format!("hold {account} {cluster}"));
        Ok(())
    }

    fn release_hold(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError> {
        self.push(format!("release {account} {cluster}"));
        Ok(())
    }

    fn reset_usage(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError> {
        self.push(format!("reset {account} {cluster}"));
        Ok(())
    }
}

impl AccountDirectory for FakeCluster {
    fn has_association(&self, account: &str, _cluster: &str) -> Result<bool, CollaboratorError> {
        Ok(!self.missing.lock().unwrap().contains(account))
    }

    fn recipient(&self, account: &str) -> Result<String, CollaboratorError> {
        Ok(format!("pi-{account}@example.edu"))
    }
}

impl Notifier for FakeCluster {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        if *self.fail_notify.lock().unwrap() {
            return Err(CollaboratorError::Delivery("mail relay unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

impl ActionLog for FakeCluster {
    fn record(&self, account: &str, event: &LedgerEvent) -> std::io::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("Account: {account} {event}"));
        Ok(())
    }
}

pub struct Harness {
    pub cluster: Arc<FakeCluster>,
    pub store: Arc<MemoryLedgerStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            cluster: Arc::new(FakeCluster::default()),
            store: Arc::new(MemoryLedgerStore::new()),
        }
    }

    /// Builds a service whose clock reads `today`.
    pub fn service_on(&self, today: NaiveDate) -> BankService {
        let collaborators = Collaborators {
            usage: self.cluster.clone(),
            actuator: self.cluster.clone(),
            directory: self.cluster.clone(),
            notifier: self.cluster.clone(),
            action_log: self.cluster.clone(),
        };
        BankService::new(
            AllocationEngine::new(AllocationPolicy::default()),
            self.store.clone(),
            Arc::new(FixedClock::new(today)),
            CLUSTERS.iter().map(|name| name.to_string()).collect(),
            collaborators,
            NoticeTemplate {
                site_name: "H2P".into(),
                signature: "The Proposal Bot".into(),
                default_grant: 10_000,
            },
        )
    }

    pub fn service(&self) -> BankService {
        self.service_on(*TODAY)
    }
}
