use std::{
    io::{stdin, IsTerminal},
    path::Path,
};

use bank_storage_json::{read_export, write_export};

use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::{io, output};
use crate::cli::registry::CommandEntry;

const CONFIRM_FLAG: &str = "--yes";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "export",
            "Write the whole ledger to a new JSON file",
            "export <file>",
            cmd_export,
        ),
        CommandEntry::new(
            "restore",
            "Replace the whole ledger with the contents of an export",
            "restore <file> [--yes]",
            cmd_restore,
        ),
    ]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = context.expect_args("export", args, 1)?;
    let path = Path::new(args[0]);
    let export = context.service()?.export()?;
    write_export(&export, path)?;
    output::success(format!(
        "Exported {} account(s) to {}",
        export.count,
        path.display()
    ));
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let confirmed = args.contains(&CONFIRM_FLAG);
    let files: Vec<&str> = args
        .iter()
        .copied()
        .filter(|arg| *arg != CONFIRM_FLAG)
        .collect();
    let files = context.expect_args("restore", &files, 1)?;
    let path = Path::new(files[0]);
    let entries = read_export(path)?;

    if !confirmed {
        if context.mode == CliMode::Script || !stdin().is_terminal() {
            return Err(CommandError::InvalidArguments(format!(
                "restore replaces the whole ledger; rerun with `{CONFIRM_FLAG}` to confirm"
            )));
        }
        let prompt = format!(
            "Replace the whole ledger with {} account(s) from {}?",
            entries.len(),
            path.display()
        );
        if !io::confirm_action(&context.theme, &prompt, false)? {
            output::info("Restore cancelled.");
            return Ok(());
        }
    }

    let count = context.service()?.restore(entries)?;
    output::success(format!(
        "Restored {} account(s) from {}",
        count,
        path.display()
    ));
    Ok(())
}
