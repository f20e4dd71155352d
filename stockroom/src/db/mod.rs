//! Persistence layer: generic storage core plus per-entity storages.

pub mod context;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod record;
pub(crate) mod statement;
pub mod storage;
pub mod tx;

pub use context::StorageContext;
pub use errors::DbError;
pub use filter::Filter;
pub use storage::Storage;
pub use tx::DataManager;
