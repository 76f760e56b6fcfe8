//! Pagination module
//!
//! Cursor pagination with a record budget.
//!
//! # Overview
//!
//! A [`Budget`] is built from a signed limit (`-1` for no limit). Before
//! every page the fetch loop negotiates the page size against it: the
//! default size while enough budget remains, the remainder otherwise. A
//! spent budget ends the loop without another request.

mod budget;
mod types;

pub use budget::Budget;
pub use types::PaginationState;
