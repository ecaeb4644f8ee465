//! Database layer - connection pool and repositories
//!
//! # Design Principles
//!
//! - One pool per process, passed around as an owned handle
//! - Every connection is borrowed through a [`Lease`] and returned on drop
//! - Randomness comes from the database (`ORDER BY random()`)
//! - No retries inside the data layer; callers decide

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{FortunePool, Lease, PoolStats};
pub use repos::FortuneRepo;
