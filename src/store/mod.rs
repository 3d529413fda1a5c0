//! The remote document store seam.
//!
//! The data source only needs one capability from a store: run a
//! [`MarketQuery`] and hand back a page of items. Implementations must allow
//! concurrent queries; a superseded query may still be running when the
//! next one starts.

use std::future::Future;

use crate::error::Result;
use crate::query::{MarketPage, MarketQuery};

pub mod embedded;
pub mod firestore;

pub use embedded::DuckDbStore;
pub use firestore::FirestoreStore;

/// Paged, sorted queries over market items.
pub trait MarketStore: Send + Sync + 'static {
    fn query(&self, query: &MarketQuery) -> impl Future<Output = Result<MarketPage>> + Send;
}

/// Split an over-fetched row set into a page and the has-more flag.
pub(crate) fn into_page<T>(mut rows: Vec<T>, page_size: usize) -> (Vec<T>, bool) {
    let has_more = rows.len() > page_size;
    rows.truncate(page_size);
    (rows, has_more)
}
