//! Metadata stamped in by `build.rs`.

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildMetadata {
    /// Label/value pairs in the order `version` prints them.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Build hash", format!("{} ({})", self.git_hash, self.git_status)),
            ("Built at", self.timestamp.to_string()),
            ("Target", self.target.to_string()),
            ("Profile", self.profile.to_string()),
            ("Rustc", self.rustc.to_string()),
        ]
    }
}

pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("CRC_BANK_BUILD_HASH").unwrap_or(UNKNOWN),
        git_status: option_env!("CRC_BANK_BUILD_STATUS").unwrap_or(UNKNOWN),
        timestamp: option_env!("CRC_BANK_BUILD_TIMESTAMP").unwrap_or(UNKNOWN),
        target: option_env!("CRC_BANK_BUILD_TARGET").unwrap_or(UNKNOWN),
        profile: option_env!("CRC_BANK_BUILD_PROFILE").unwrap_or(UNKNOWN),
        rustc: option_env!("CRC_BANK_BUILD_RUSTC").unwrap_or(UNKNOWN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pair_hash_with_tree_status() {
        let meta = BuildMetadata {
            version: "0.1.0",
            git_hash: "abc123",
            git_status: "dirty",
            timestamp: "t",
            target: "x86_64",
            profile: "debug",
            rustc: "rustc",
        };
        let rows = meta.rows();
        assert_eq!(rows[0], ("Build hash", "abc123 (dirty)".to_string()));
        assert_eq!(rows.len(), 5);
    }
}
