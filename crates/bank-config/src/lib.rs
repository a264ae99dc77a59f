//! bank-config
//!
//! Site configuration for the allocation bank: clusters, file locations,
//! grant policy, notification and Slurm settings, plus disk persistence.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, NotificationConfig, PolicyConfig, SlurmConfig};
