pub mod auth;
pub mod orders;
pub mod pagination;
pub mod products;
pub mod users;
