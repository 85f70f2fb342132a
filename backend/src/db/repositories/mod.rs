//! Repository backends:
//! - `local`: in-memory, for development and tests
//! - `postgres`: PostgreSQL through Diesel
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
