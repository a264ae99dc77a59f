//! Orchestrates one ledger operation end to end.
//!
//! Each call loads the entry, lets the [`AllocationEngine`] decide, carries
//! out the requested side effects on every configured cluster, then persists
//! the updated entry. A failing collaborator aborts the call before anything
//! is written, so the next run retries from the same state.

use std::sync::Arc;

use bank_domain::{
    service_units_from_seconds, AccountLedgerEntry, EnforcementAction, SideEffect,
};
use tracing::{info, warn};

use crate::{
    AccountDirectory, ActionLog, AllocationEngine, Clock, CoreError, Decision,
    EnforcementActuator, LedgerEvent, LedgerExport, LedgerStore, NoticeTemplate, Notifier,
    UsageSource,
};

/// External systems the service drives.
#[derive(Clone)]
pub struct Collaborators {
    pub usage: Arc<dyn UsageSource>,
    pub actuator: Arc<dyn EnforcementActuator>,
    pub directory: Arc<dyn AccountDirectory>,
    pub notifier: Arc<dyn Notifier>,
    pub action_log: Arc<dyn ActionLog>,
}

/// What an operation did, for reporting back to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub entry: AccountLedgerEntry,
    pub effects: Vec<SideEffect>,
    pub events: Vec<LedgerEvent>,
    pub advisories: Vec<String>,
    /// Usage in service units, when the operation queried it.
    pub usage: Option<u64>,
}

pub struct BankService {
    engine: AllocationEngine,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    clusters: Vec<String>,
    collaborators: Collaborators,
    template: NoticeTemplate,
}

impl BankService {
    pub fn new(
        engine: AllocationEngine,
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        clusters: Vec<String>,
        collaborators: Collaborators,
        template: NoticeTemplate,
    ) -> Self {
        Self {
            engine,
            store,
            clock,
            clusters,
            collaborators,
            template,
        }
    }

    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }

    pub fn insert(&self, account: &str, limit: &str) -> Result<Outcome, CoreError> {
        self.verify_associations(account)?;
        let existing = self.store.get(account)?;
        let decision =
            self.engine
                .insert(existing.as_ref(), account, limit, self.clock.today())?;
        self.commit(None, decision, None)
    }

    pub fn modify(&self, account: &str, limit: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let decision = self
            .engine
            .modify(entry.clone(), limit, self.clock.today())?;
        self.commit(Some(&entry), decision, None)
    }

    pub fn add(&self, account: &str, delta: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let decision = self.engine.add(entry.clone(), delta)?;
        self.commit(Some(&entry), decision, None)
    }

    pub fn balance(&self, account: &str) -> Result<AccountLedgerEntry, CoreError> {
        self.load(account)
    }

    /// Queries usage and enforces the account's limit.
    pub fn check_limit(&self, account: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let usage = self.usage_units(account)?;
        let decision = self.engine.check_usage(entry.clone(), usage);
        self.commit(Some(&entry), decision, Some(usage))
    }

    /// Rolls the account into a new period when the current one has expired.
    pub fn check_period(&self, account: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let decision = self.engine.rollover(entry.clone(), self.clock.today());
        self.commit(Some(&entry), decision, None)
    }

    pub fn reset_usage(&self, account: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let decision = self.engine.reset_usage(entry.clone(), self.clock.today());
        self.commit(Some(&entry), decision, None)
    }

    pub fn release_hold(&self, account: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let usage = self.usage_units(account)?;
        let decision = self.engine.release_hold(entry.clone(), usage)?;
        self.commit(Some(&entry), decision, Some(usage))
    }

    pub fn pre_expiry_notice(&self, account: &str) -> Result<Outcome, CoreError> {
        let entry = self.load(account)?;
        let decision = self
            .engine
            .pre_expiry_notice(entry.clone(), self.clock.today());
        self.commit(Some(&entry), decision, None)
    }

    pub fn entries(&self) -> Result<Vec<AccountLedgerEntry>, CoreError> {
        self.store.all()
    }

    pub fn export(&self) -> Result<LedgerExport, CoreError> {
        Ok(LedgerExport::new(self.store.all()?))
    }

    /// Replaces the whole ledger with `entries`. Returns how many were loaded.
    pub fn restore(&self, entries: Vec<AccountLedgerEntry>) -> Result<usize, CoreError> {
        let count = entries.len();
        self.store.replace_all(entries)?;
        info!(count, "ledger restored");
        Ok(count)
    }

    fn load(&self, account: &str) -> Result<AccountLedgerEntry, CoreError> {
        self.verify_associations(account)?;
        self.store
            .get(account)?
            .ok_or_else(|| CoreError::AccountNotFound(account.to_string()))
    }

    fn verify_associations(&self, account: &str) -> Result<(), CoreError> {
        for cluster in &self.clusters {
            if !self.collaborators.directory.has_association(account, cluster)? {
                return Err(CoreError::MissingAssociation {
                    account: account.to_string(),
                    cluster: cluster.clone(),
                });
            }
        }
        Ok(())
    }

    /// Sums raw usage over every cluster, then converts to service units.
    fn usage_units(&self, account: &str) -> Result<u64, CoreError> {
        let mut raw_seconds = 0u64;
        for cluster in &self.clusters {
            let raw = self.collaborators.usage.raw_usage(account, cluster)?;
            raw_seconds = raw_seconds.saturating_add(raw);
        }
        Ok(service_units_from_seconds(raw_seconds))
    }

    fn commit(
        &self,
        original: Option<&AccountLedgerEntry>,
        decision: Decision,
        usage: Option<u64>,
    ) -> Result<Outcome, CoreError> {
        for effect in &decision.effects {
            self.execute(effect)?;
        }
        if original != Some(&decision.entry) {
            self.store.upsert(&decision.entry)?;
        }

        let account = decision.entry.account.as_str();
        for event in &decision.events {
            info!(account, %event, "ledger updated");
            if let Err(err) = self.collaborators.action_log.record(account, event) {
                warn!(account, %event, error = %err, "failed to write action log");
            }
        }

        Ok(Outcome {
            entry: decision.entry,
            effects: decision.effects,
            events: decision.events,
            advisories: decision.advisories,
            usage,
        })
    }

    fn execute(&self, effect: &SideEffect) -> Result<(), CoreError> {
        match effect {
            SideEffect::Enforce { account, action } => {
                let actuator = &self.collaborators.actuator;
                for cluster in &self.clusters {
                    match action {
                        EnforcementAction::Hold => actuator.apply_hold(account, cluster)?,
                        EnforcementAction::Release => actuator.release_hold(account, cluster)?,
                        EnforcementAction::ResetUsage => actuator.reset_usage(account, cluster)?,
                    }
                }
            }
            SideEffect::Notify { account, notice } => {
                let recipient = self.collaborators.directory.recipient(account)?;
                let rendered = self.template.render(notice);
                self.collaborators
                    .notifier
                    .notify(&recipient, &rendered.subject, &rendered.body)?;
                info!(account, recipient = %recipient, kind = notice.kind(), "notice sent");
            }
        }
        Ok(())
    }
}
