//! Database layer - connection pool, schema, repository and search
//!
//! # Design Principles
//!
//! - Connection pool, connections handed to repositories explicitly
//! - Writes take a transaction owned by the usecase
//! - Rely on DB constraints for uniqueness - no check-then-insert
//! - All statements are parameterised

pub mod migrations;
pub mod pool;
pub mod repos;
pub mod search;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
pub use search::{PgUserSearch, UserSearch};
