//! Response classification
//!
//! Maps every [`PageResult`] variant onto either a [`Page`] or an [`Error`].

use crate::error::{Error, Result};
use crate::types::{Page, PageResult};

/// Split a page result into data or a classified error
pub fn classify<T>(result: PageResult<T>) -> Result<Page<T>> {
    match result {
        PageResult::Data {
            items,
            next_page_token,
        } => Ok(Page {
            items,
            next_page_token,
        }),
        PageResult::BadRequest(e) => Err(Error::bad_request(e.error_type, e.message)),
        PageResult::Unauthorized(e) => Err(Error::unauthorized(e.error_type, e.message)),
        PageResult::Forbidden(e) => Err(Error::forbidden(e.error_type, e.message)),
        PageResult::Transport(message) => Err(Error::transport(message)),
    }
}
