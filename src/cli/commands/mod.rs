mod account;
mod backup;
mod system;

use bank_core::Outcome;
use bank_domain::SideEffect;

use crate::cli::output;
use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in account::definitions()
        .into_iter()
        .chain(backup::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
}

/// Prints advisories and the side effects an operation carried out.
pub(crate) fn report_outcome(outcome: &Outcome, clusters: usize) {
    for advisory in &outcome.advisories {
        output::warning(advisory);
    }
    for effect in &outcome.effects {
        match effect {
            SideEffect::Enforce { account, action } => output::info(format!(
                "Applied {action} to {account} on {clusters} cluster(s)"
            )),
            SideEffect::Notify { account, notice } => {
                output::info(format!("Sent {} notice for {account}", notice.kind()))
            }
        }
    }
}
