//! Persistence layer: row models, the `Store` abstraction and its
//! Postgres and in-memory implementations.

pub mod models;
pub mod store;
pub mod postgres;
pub mod memory;

pub use models::{AccountType, RequestStatus, Role, User, VipUpgradeRequest};
pub use store::Store;
pub use postgres::PgStore;
pub use memory::MemoryStore;
