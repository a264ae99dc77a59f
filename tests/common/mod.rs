#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use serde_json::json;
use tempfile::TempDir;

const SACCTMGR: &str = r#"#!/bin/sh
echo "$*" >> "$STUB_DIR/sacctmgr.log"
account=""
for arg in "$@"; do
    case "$arg" in
        account=*) account="${arg#account=}" ;;
    esac
done
case "$*" in
    *"show assoc"*)
        if [ ! -e "$STUB_DIR/no-assoc-$account" ]; then
            echo "  $account  cluster"
        fi
        ;;
    *"list account"*)
        echo "pi-$account"
        ;;
esac
"#;

const SSHARE: &str = r#"#!/bin/sh
account=""
cluster=""
for arg in "$@"; do
    case "$arg" in
        --account=*) account="${arg#--account=}" ;;
        --cluster=*) cluster="${arg#--cluster=}" ;;
    esac
done
echo "CLUSTER: $cluster"
cat "$STUB_DIR/usage-$account-$cluster" 2>/dev/null || echo 0
"#;

const SENDMAIL: &str = r#"#!/bin/sh
cat >> "$STUB_DIR/mail.log"
echo "---" >> "$STUB_DIR/mail.log"
"#;

/// Stub programs shared by every test in the binary, written before any test spawns a process.
static STUBS: Lazy<TempDir> = Lazy::new(|| {
    let dir = TempDir::new().expect("stub dir");
    for (name, body) in [("sacctmgr", SACCTMGR), ("sshare", SSHARE), ("sendmail", SENDMAIL)] {
        let path = dir.path().join(name);
        fs::write(&path, body).expect("write stub");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
    }
    dir
});

pub const CLUSTERS: [&str; 2] = ["smp", "gpu"];

/// Isolated `CRC_BANK_HOME` wired to the stub Slurm and mail programs.
pub struct BankHome {
    dir: TempDir,
}

impl BankHome {
    pub fn new() -> Self {
        let stubs = STUBS.path();
        let dir = TempDir::new().expect("home dir");
        let config = json!({
            "clusters": CLUSTERS,
            "policy": { "min_grant": 10000, "default_grant": 10000 },
            "notifications": {
                "site_name": "H2P",
                "sender": "proposal_bot@example.edu",
                "mail_domain": "example.edu",
                "sendmail_path": stubs.join("sendmail"),
            },
            "slurm": {
                "sacctmgr_path": stubs.join("sacctmgr"),
                "sshare_path": stubs.join("sshare"),
            },
        });
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("config dir");
        fs::write(
            config_dir.join("config.json"),
            serde_json::to_string_pretty(&config).expect("config json"),
        )
        .expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("crc_bank_cli").expect("binary");
        cmd.env("CRC_BANK_HOME", self.path())
            .env("STUB_DIR", self.path())
            .env("NO_COLOR", "1")
            .env_remove("CRC_BANK_CLI_SCRIPT")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn script(&self) -> Command {
        let mut cmd = self.cli();
        cmd.env("CRC_BANK_CLI_SCRIPT", "1");
        cmd
    }

    pub fn set_usage_seconds(&self, account: &str, cluster: &str, seconds: u64) {
        fs::write(
            self.path().join(format!("usage-{account}-{cluster}")),
            format!("{seconds}\n"),
        )
        .expect("write usage");
    }

    pub fn remove_association(&self, account: &str) {
        fs::write(self.path().join(format!("no-assoc-{account}")), "").expect("marker");
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.path().join("ledger").join("crc-bank.json")
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).unwrap_or_default()
    }

    pub fn sacctmgr_log(&self) -> String {
        self.read("sacctmgr.log")
    }

    pub fn mail_log(&self) -> String {
        self.read("mail.log")
    }

    pub fn action_log(&self) -> String {
        self.read("crc-bank.log")
    }
}
