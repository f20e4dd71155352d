use serde::Serialize;

/// A page of results together with the total number of matching rows.
///
/// `count` reflects the whole filtered result set, not the page, so clients
/// can render page controls.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: i64,
}
