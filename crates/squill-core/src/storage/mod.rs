//! SQLite-backed bronze/silver/gold stores.

pub mod error;
pub mod repositories;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use repositories::{
    DatasetRepository, EnrichedRepository, NatSqlRepository, SchemaRepository,
};
pub use store::{Store, Tier};
