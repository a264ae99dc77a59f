//! Slurm-backed collaborators, driven through `sacctmgr` and `sshare`.

use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};

use bank_core::{AccountDirectory, CollaboratorError, EnforcementActuator, UsageSource};
use tracing::debug;

/// Runs an external program and returns its stdout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[String]) -> Result<String, CollaboratorError>;

    /// Like [`CommandRunner::run`], feeding `input` on stdin.
    fn run_with_input(
        &self,
        program: &Path,
        args: &[String],
        input: &str,
    ) -> Result<String, CollaboratorError>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn execute(
        program: &Path,
        args: &[String],
        input: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        let name = program.display().to_string();
        debug!(program = %name, ?args, "running command");
        let spawn_err = |source| CollaboratorError::Spawn {
            program: name.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        if !output.status.success() {
            return Err(CollaboratorError::Failed {
                program: name,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<String, CollaboratorError> {
        Self::execute(program, args, None)
    }

    fn run_with_input(
        &self,
        program: &Path,
        args: &[String],
        input: &str,
    ) -> Result<String, CollaboratorError> {
        Self::execute(program, args, Some(input))
    }
}

/// Reads cumulative `RawUsage` from `sshare`.
pub struct SlurmUsage {
    runner: Arc<dyn CommandRunner>,
    sshare: PathBuf,
}

impl SlurmUsage {
    pub fn new(runner: Arc<dyn CommandRunner>, sshare: PathBuf) -> Self {
        Self { runner, sshare }
    }
}

impl UsageSource for SlurmUsage {
    fn raw_usage(&self, account: &str, cluster: &str) -> Result<u64, CollaboratorError> {
        let args = vec![
            "--noheader".to_string(),
            format!("--account={account}"),
            format!("--cluster={cluster}"),
            "--format=RawUsage".to_string(),
        ];
        let stdout = self.runner.run(&self.sshare, &args)?;
        parse_raw_usage(&stdout).ok_or_else(|| CollaboratorError::Output {
            program: self.sshare.display().to_string(),
            detail: format!("no RawUsage value for {account} on {cluster}"),
        })
    }
}

/// First numeric line after the optional `CLUSTER:` banner.
fn parse_raw_usage(stdout: &str) -> Option<u64> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("CLUSTER:"))?;
    line.parse().ok()
}

/// Holds, releases and resets accounts with `sacctmgr`.
pub struct SlurmActuator {
    runner: Arc<dyn CommandRunner>,
    sacctmgr: PathBuf,
}

impl SlurmActuator {
    pub fn new(runner: Arc<dyn CommandRunner>, sacctmgr: PathBuf) -> Self {
        Self { runner, sacctmgr }
    }

    fn modify(&self, account: &str, cluster: &str, setting: &str) -> Result<(), CollaboratorError> {
        let args = vec![
            "-i".to_string(),
            "modify".to_string(),
            "account".to_string(),
            "where".to_string(),
            format!("account={account}"),
            format!("cluster={cluster}"),
            "set".to_string(),
            setting.to_string(),
        ];
        self.runner.run(&self.sacctmgr, &args).map(|_| ())
    }
}

impl EnforcementActuator for SlurmActuator {
    fn apply_hold(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError> {
        self.modify(account, cluster, "GrpTresRunMins=cpu=0")
    }

    fn release_hold(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError> {
        self.modify(account, cluster, "GrpTresRunMins=cpu=-1")
    }

    fn reset_usage(&self, account: &str, cluster: &str) -> Result<(), CollaboratorError> {
        self.modify(account, cluster, "RawUsage=0")
    }
}

/// Association checks and notice recipients from the Slurm account database.
pub struct SlurmDirectory {
    runner: Arc<dyn CommandRunner>,
    sacctmgr: PathBuf,
    mail_domain: String,
}

impl SlurmDirectory {
    pub fn new(runner: Arc<dyn CommandRunner>, sacctmgr: PathBuf, mail_domain: String) -> Self {
        Self {
            runner,
            sacctmgr,
            mail_domain,
        }
    }
}

impl AccountDirectory for SlurmDirectory {
    fn has_association(&self, account: &str, cluster: &str) -> Result<bool, CollaboratorError> {
        let args = vec![
            "-n".to_string(),
            "show".to_string(),
            "assoc".to_string(),
            format!("account={account}"),
            format!("cluster={cluster}"),
            "format=account,cluster".to_string(),
        ];
        let stdout = self.runner.run(&self.sacctmgr, &args)?;
        Ok(stdout
            .lines()
            .next()
            .is_some_and(|line| !line.trim().is_empty()))
    }

    /// The account description names the responsible user.
    fn recipient(&self, account: &str) -> Result<String, CollaboratorError> {
        let args = vec![
            "-n".to_string(),
            "list".to_string(),
            "account".to_string(),
            format!("account={account}"),
            "format=description".to_string(),
        ];
        let stdout = self.runner.run(&self.sacctmgr, &args)?;
        let user = stdout.trim();
        if user.is_empty() {
            return Err(CollaboratorError::Output {
                program: self.sacctmgr.display().to_string(),
                detail: format!("account {account} has no description to mail"),
            });
        }
        Ok(format!("{user}@{}", self.mail_domain))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    #[test]
    fn usage_skips_cluster_banner() {
        let runner = Arc::new(ScriptedRunner::default().reply("CLUSTER: smp\n  7200\n"));
        let usage = SlurmUsage::new(runner.clone(), PathBuf::from("sshare"));

        assert_eq!(usage.raw_usage("grpA", "smp").unwrap(), 7200);
        let (program, args, _) = &runner.calls()[0];
        assert_eq!(program, "sshare");
        assert_eq!(
            args,
            &["--noheader", "--account=grpA", "--cluster=smp", "--format=RawUsage"]
        );
    }

    #[test]
    fn unparsable_usage_is_an_output_error() {
        let runner = Arc::new(ScriptedRunner::default().reply("CLUSTER: smp\n"));
        let usage = SlurmUsage::new(runner, PathBuf::from("sshare"));
        assert!(matches!(
            usage.raw_usage("grpA", "smp"),
            Err(CollaboratorError::Output { .. })
        ));
    }

    #[test]
    fn actuator_sets_run_minutes_and_raw_usage() {
        let runner = Arc::new(ScriptedRunner::default());
        let actuator = SlurmActuator::new(runner.clone(), PathBuf::from("/opt/slurm/sacctmgr"));

        actuator.apply_hold("grpA", "smp").unwrap();
        actuator.release_hold("grpA", "gpu").unwrap();
        actuator.reset_usage("grpA", "smp").unwrap();

        let settings: Vec<String> = runner
            .calls()
            .into_iter()
            .map(|(_, args, _)| args.join(" "))
            .collect();
        assert_eq!(
            settings,
            vec![
                "-i modify account where account=grpA cluster=smp set GrpTresRunMins=cpu=0",
                "-i modify account where account=grpA cluster=gpu set GrpTresRunMins=cpu=-1",
                "-i modify account where account=grpA cluster=smp set RawUsage=0",
            ]
        );
    }

    #[test]
    fn association_requires_non_blank_first_line() {
        let runner = Arc::new(
            ScriptedRunner::default()
                .reply("      grpA        smp \n")
                .reply("\n")
                .reply(""),
        );
        let directory = SlurmDirectory::new(runner, PathBuf::from("sacctmgr"), "pitt.edu".into());

        assert!(directory.has_association("grpA", "smp").unwrap());
        assert!(!directory.has_association("grpA", "gpu").unwrap());
        assert!(!directory.has_association("grpB", "smp").unwrap());
    }

    #[test]
    fn recipient_uses_description_and_mail_domain() {
        let runner = Arc::new(ScriptedRunner::default().reply("  jdoe \n").reply("   \n"));
        let directory = SlurmDirectory::new(runner, PathBuf::from("sacctmgr"), "pitt.edu".into());

        assert_eq!(directory.recipient("grpA").unwrap(), "jdoe@pitt.edu");
        assert!(directory.recipient("grpB").is_err());
    }

    #[test]
    fn command_failures_propagate() {
        let runner = Arc::new(ScriptedRunner::default().fail(CollaboratorError::Failed {
            program: "sacctmgr".into(),
            status: "exit status: 1".into(),
            stderr: "permission denied".into(),
        }));
        let actuator = SlurmActuator::new(runner, PathBuf::from("sacctmgr"));
        let err = actuator.apply_hold("grpA", "smp").expect_err("failure");
        assert!(err.to_string().contains("permission denied"));
    }
}
