//! Thread-local match-execution context.
//!
//! Query execution reuses one engine `QueryCursor` per thread instead of
//! allocating a new one per call. Acquisition is exclusive: a nested
//! acquisition on the same thread fails with
//! [`CanopyError::MatchContextBusy`] rather than sharing the cursor.

use crate::errors::{CanopyError, Result};
use std::cell::RefCell;
use tree_sitter::QueryCursor;

thread_local! {
    static MATCH_CURSOR: RefCell<QueryCursor> = RefCell::new(QueryCursor::new());
}

/// Execute `f` with this thread's match cursor.
pub(crate) fn with_match_cursor<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut QueryCursor) -> R,
{
    MATCH_CURSOR.with(|cell| {
        let mut cursor = cell
            .try_borrow_mut()
            .map_err(|_| CanopyError::MatchContextBusy)?;
        Ok(f(&mut cursor))
    })
}
