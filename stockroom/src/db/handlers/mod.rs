//! Per-entity storages built on the generic façade.
//!
//! Each storage knows its entity's lookup patterns and nothing about SQL;
//! filters are assembled here and handed to [`crate::db::Storage`].

pub mod orders;
pub mod products;
pub mod users;
