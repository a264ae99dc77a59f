use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output::{self, line, section};
use crate::cli::registry::CommandEntry;

use super::report_outcome;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "insert",
            "Add an account with a service-unit limit (-1 for unlimited)",
            "insert <account> <limit>",
            cmd_insert,
        ),
        CommandEntry::new(
            "modify",
            "Replace an account's limit and restart its period",
            "modify <account> <limit>",
            cmd_modify,
        ),
        CommandEntry::new(
            "add",
            "Add service units to an account's limit",
            "add <account> <limit>",
            cmd_add,
        ),
        CommandEntry::new(
            "get-balance",
            "Show an account's limit and period",
            "get-balance <account>",
            cmd_get_balance,
        ),
        CommandEntry::new(
            "check-limit",
            "Compare usage to the limit, holding and notifying as needed",
            "check-limit <account>",
            cmd_check_limit,
        ),
        CommandEntry::new(
            "check-period",
            "Roll the account over once its period has ended",
            "check-period <account>",
            cmd_check_period,
        ),
        CommandEntry::new(
            "reset-usage",
            "Zero the account's raw usage and restart its period",
            "reset-usage <account>",
            cmd_reset_usage,
        ),
        CommandEntry::new(
            "release-hold",
            "Lift the hold once usage is below the limit",
            "release-hold <account>",
            cmd_release_hold,
        ),
        CommandEntry::new(
            "pre-expiry-notice",
            "Warn the account ahead of its period rollover",
            "pre-expiry-notice <account>",
            cmd_pre_expiry_notice,
        ),
        CommandEntry::new("list", "List every account in the ledger", "list", cmd_list),
    ]
}

fn cmd_insert(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("insert", args, 2)?;
    let outcome = context.service()?.insert(args[0], args[1])?;
    report_outcome(&outcome, context.config().clusters.len());
    output::success(format!(
        "Inserted {} with a limit of {} SUs",
        outcome.entry.account, outcome.entry.limit
    ));
    Ok(())
}

fn cmd_modify(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("modify", args, 2)?;
    let outcome = context.service()?.modify(args[0], args[1])?;
    report_outcome(&outcome, context.config().clusters.len());
    output::success(format!(
        "{} now has a limit of {} SUs, period restarted on {}",
        outcome.entry.account, outcome.entry.limit, outcome.entry.period_start
    ));
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("add", args, 2)?;
    let outcome = context.service()?.add(args[0], args[1])?;
    report_outcome(&outcome, context.config().clusters.len());
    output::success(format!(
        "{} now has a limit of {} SUs",
        outcome.entry.account, outcome.entry.limit
    ));
    Ok(())
}

fn cmd_get_balance(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("get-balance", args, 1)?;
    let entry = context.service()?.balance(args[0])?;
    line(format!("Account: {}", entry.account));
    line(format!("SUs: {}", entry.limit));
    line(format!("Period start: {}", entry.period_start));
    line(format!(
        "Near-limit notice sent: {}",
        yes_no(entry.near_limit_notified)
    ));
    line(format!(
        "Limit-reached notice sent: {}",
        yes_no(entry.limit_reached_notified)
    ));
    Ok(())
}

fn cmd_check_limit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("check-limit", args, 1)?;
    let outcome = context.service()?.check_limit(args[0])?;
    let entry = &outcome.entry;
    if let Some(usage) = outcome.usage {
        line(format!("Usage: {} of {} SUs", usage, entry.limit));
    }
    report_outcome(&outcome, context.config().clusters.len());
    if outcome.effects.is_empty() {
        output::success(format!("{} is within its allocation", entry.account));
    }
    Ok(())
}

fn cmd_check_period(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("check-period", args, 1)?;
    let outcome = context.service()?.check_period(args[0])?;
    let entry = &outcome.entry;
    if outcome.events.is_empty() {
        output::info(format!(
            "{} is still in the period that started on {}",
            entry.account, entry.period_start
        ));
        return Ok(());
    }
    report_outcome(&outcome, context.config().clusters.len());
    output::success(format!(
        "{} rolled over: {} SUs from {}",
        entry.account, entry.limit, entry.period_start
    ));
    Ok(())
}

fn cmd_reset_usage(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("reset-usage", args, 1)?;
    let outcome = context.service()?.reset_usage(args[0])?;
    report_outcome(&outcome, context.config().clusters.len());
    output::success(format!(
        "Usage reset for {}, period restarted on {}",
        outcome.entry.account, outcome.entry.period_start
    ));
    Ok(())
}

fn cmd_release_hold(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("release-hold", args, 1)?;
    let outcome = context.service()?.release_hold(args[0])?;
    report_outcome(&outcome, context.config().clusters.len());
    output::success(format!("Released the hold on {}", outcome.entry.account));
    Ok(())
}

fn cmd_pre_expiry_notice(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("pre-expiry-notice", args, 1)?;
    let outcome = context.service()?.pre_expiry_notice(args[0])?;
    if outcome.effects.is_empty() {
        output::info(format!("No rollover notice due for {}", outcome.entry.account));
    } else {
        report_outcome(&outcome, context.config().clusters.len());
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.expect_args("list", args, 0)?;
    let entries = context.service()?.entries()?;
    if entries.is_empty() {
        output::info("The ledger is empty.");
        return Ok(());
    }
    section("Ledger");
    line(format!("  {:<20} {:>12}  {}", "Account", "SUs", "Period start"));
    for entry in &entries {
        let flags = match (entry.near_limit_notified, entry.limit_reached_notified) {
            (_, true) => " (limit reached)",
            (true, false) => " (near limit)",
            _ => "",
        };
        line(format!(
            "  {:<20} {:>12}  {}{}",
            entry.account,
            entry.limit.to_string(),
            entry.period_start,
            flags
        ));
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
