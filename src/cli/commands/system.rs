use bank_storage_json::LEDGER_SCHEMA_VERSION;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::output::{line, section};
use crate::cli::registry::CommandEntry;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Stop reading script input", "exit", cmd_exit),
    ]
}

fn cmd_version(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.expect_args("version", args, 0)?;
    let meta = build_info::current();
    section(format!("CRC Bank {}", meta.version));
    line(format!("  Ledger schema: v{}", LEDGER_SCHEMA_VERSION));
    for (label, value) in meta.rows() {
        line(format!("  {:<13}: {}", label, value));
    }
    line(format!("  Home         : {}", context.home().display()));
    line(format!("  Config       : {}", context.config_path().display()));
    line(format!("  Clusters     : {}", context.config().clusters.join(", ")));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        return match context.command(&name.to_lowercase()) {
            Some(entry) => {
                help::print_command(entry);
                Ok(())
            }
            None => Err(CommandError::UnknownCommand(name.to_string())),
        };
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
