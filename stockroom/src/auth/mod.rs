//! Bearer-token authentication: password hashing, session tokens, and the
//! request extractor for the signed-in user.

pub mod current_user;
pub mod password;
pub mod session;
