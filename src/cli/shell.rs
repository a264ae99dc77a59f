use std::{
    env,
    io::{self, BufRead},
};

use shell_words::split;
use tracing::warn;

use crate::cli::core::{CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::help;
use crate::errors::CliError;

/// Set to run one command per stdin line instead of a single command from argv.
pub const SCRIPT_ENV: &str = "CRC_BANK_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::OneShot
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::OneShot => {
            let args: Vec<String> = env::args().skip(1).collect();
            run_once(&mut context, &args)
        }
        CliMode::Script => run_script(&mut context, io::stdin().lock()),
    }
}

fn run_once(context: &mut ShellContext, args: &[String]) -> Result<(), CliError> {
    let Some((raw, rest)) = args.split_first() else {
        help::print_overview(&context.registry);
        return Ok(());
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    match context.dispatch(&raw.to_lowercase(), raw, &rest) {
        Ok(_) => Ok(()),
        Err(CommandError::UnknownCommand(raw)) => {
            context.suggest_command(&raw);
            Err(CliError::Input(format!("unknown command `{raw}`")))
        }
        Err(err) => Err(err.into()),
    }
}

/// Runs every line, reporting failures as they happen; fails overall if any line failed.
fn run_script(context: &mut ShellContext, input: impl BufRead) -> Result<(), CliError> {
    let mut failures = 0usize;
    for line in input.lines() {
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => {
                warn!(command = %line.trim(), error = %err, "command failed");
                context.report_error(&err);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(CliError::Command(format!("{failures} command(s) failed")));
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = split(line)
        .map_err(|err| CommandError::InvalidArguments(format!("cannot parse `{line}`: {err}")))?;

    // Blank lines and comments.
    let Some(raw) = tokens.first().filter(|token| !token.starts_with('#')) else {
        return Ok(LoopControl::Continue);
    };

    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    context.dispatch(&command, raw, &args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn context(home: &std::path::Path) -> ShellContext {
        ShellContext::with_home(CliMode::Script, home.to_path_buf()).expect("context")
    }

    #[test]
    fn script_skips_comments_and_stops_at_exit() {
        let dir = tempdir().unwrap();
        let mut app = context(dir.path());
        let input = Cursor::new("# nightly batch\n\nhelp\nexit\nbogus\n");

        // `bogus` would fail the run if `exit` did not stop it.
        run_script(&mut app, input).expect("script succeeds");
    }

    #[test]
    fn script_reports_failure_count() {
        let dir = tempdir().unwrap();
        let mut app = context(dir.path());
        let input = Cursor::new("bogus\nhelp insert\nversion extra 'unterminated\n");

        let err = run_script(&mut app, input).expect_err("two failures");
        assert_eq!(err.to_string(), "Command failed: 2 command(s) failed");
    }

    #[test]
    fn empty_argv_prints_overview() {
        let dir = tempdir().unwrap();
        let mut app = context(dir.path());
        assert!(run_once(&mut app, &[]).is_ok());
        let err = run_once(&mut app, &["chek-limit".to_string()]).expect_err("unknown");
        assert!(matches!(err, CliError::Input(_)));
    }
}
