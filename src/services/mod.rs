// Service exports
pub mod cache;
pub mod ctgov;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use ctgov::{CtGovClient, CtGovError};
pub use postgres::{PostgresClient, PostgresError, UpsertedMatch};
