//! Database row types and their table bindings.

pub mod orders;
pub mod products;
pub mod users;
