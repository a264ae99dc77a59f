//! Shell context, dispatch and the CLI error type.

use std::{
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

use bank_config::{Config, ConfigManager};
use bank_core::{BankService, CoreError};
use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;

use super::commands;
use super::output;
use super::registry::{CommandEntry, CommandRegistry};
use crate::{errors::CliError, runtime, utils::paths};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    /// A single command taken from the process arguments.
    OneShot,
    /// One command per stdin line.
    Script,
}

pub type CommandResult = Result<(), CommandError>;

/// Runtime state shared by every command handler.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    home: PathBuf,
    config_path: PathBuf,
    config: Config,
    service: Option<BankService>,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_home(mode, paths::app_data_dir())
    }

    pub fn with_home(mode: CliMode, home: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(&home)?;
        let config = config_manager.load()?;
        if !io::stdout().is_terminal() {
            colored::control::set_override(false);
        }

        Ok(Self {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            config_path: config_manager.config_path().to_path_buf(),
            home,
            config,
            service: None,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the ledger on first use; commands that never touch it never lock it.
    pub(crate) fn service(&mut self) -> Result<&BankService, CommandError> {
        let service = match self.service.take() {
            Some(service) => service,
            None => runtime::build_service(&self.config, &self.home)?,
        };
        Ok(&*self.service.insert(service))
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.handler(command) else {
            return Err(CommandError::UnknownCommand(raw.to_string()));
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn report_error(&self, err: &CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::UnknownCommand(raw) => self.suggest_command(raw),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            other => output::error(other),
        }
    }

    /// Validates the argument count against the command's usage line.
    pub(crate) fn expect_args<'a>(
        &self,
        name: &str,
        args: &[&'a str],
        count: usize,
    ) -> Result<Vec<&'a str>, CommandError> {
        if args.len() == count {
            return Ok(args.to_vec());
        }
        let usage = self.command(name).map_or(name, |entry| entry.usage);
        Err(CommandError::InvalidArguments(format!("usage: {usage}")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Core(inner) => CommandError::Core(inner),
            CliError::Input(message) => CommandError::InvalidArguments(message),
            other => CommandError::Message(other.to_string()),
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}
