pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{TracingReporter, XrpcClient};
pub use crate::core::migration::{Credentials, MigrationEngine, MigrationReport, MigrationRequest};
pub use domain::model::{ListMetadata, ListPurpose, MigrationEvent, MigrationOutcome, Pacing};
pub use utils::error::{MigrateError, Result};
