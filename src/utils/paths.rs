use dirs::home_dir;
use std::{env, path::PathBuf};

pub const HOME_ENV: &str = "CRC_BANK_HOME";
const DEFAULT_DIR_NAME: &str = ".crc_bank";

/// Returns the bank's home directory, defaulting to `~/.crc_bank`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}
