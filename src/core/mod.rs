pub mod auth;
pub mod list;
pub mod members;
pub mod migration;
pub mod replicate;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    AccountRole, AtUri, Identity, ListMetadata, ListReference, MigrationEvent, MigrationOutcome,
    Pacing, ReplicationResult, Stage,
};
pub use crate::domain::ports::{ConfigProvider, EventSink, RecordApi};
pub use crate::utils::error::Result;
