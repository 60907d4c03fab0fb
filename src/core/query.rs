//! Paged retrieval over a store
//!
//! [`get`] composes the substring filter, an optional extra predicate, the
//! page window and include expansion into one [`Query`], then reports the
//! page together with counts taken over every matching row.

use crate::core::entity::Entity;
use crate::core::error::CrudError;
use crate::core::predicate::{Predicate, build_text_filter};
use crate::core::store::{Query, Store};
use serde::Serialize;

/// Sentinel page number that disables windowing
pub const ALL_PAGES: i64 = -1;

/// Paged result wrapper
///
/// `page_count = ceil(row_count / page_size)`. When the query ran with
/// `page == -1` every matching row is in `items` and `current_page` /
/// `page_count` carry no meaning.
#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope<T> {
    pub current_page: i64,
    pub page_size: i64,
    /// Rows matching the filters, across all pages
    pub row_count: usize,
    pub page_count: usize,
    pub items: Vec<T>,
}

impl<T> PageEnvelope<T> {
    pub fn new(current_page: i64, page_size: i64, row_count: usize, items: Vec<T>) -> Self {
        let page_count = match usize::try_from(page_size) {
            Ok(size) if size > 0 => row_count.div_ceil(size),
            _ => 0,
        };

        Self {
            current_page,
            page_size,
            row_count,
            page_count,
            items,
        }
    }
}

/// Split a comma-separated include list, dropping blank entries
pub fn parse_includes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(String::from)
        .collect()
}

/// Run a paged query against `store`
///
/// The substring filter on `filter` is always applied; `predicate` narrows
/// the same set before the page window is cut, so `row_count` counts every
/// row that passes both. `page` is 1-based; [`ALL_PAGES`] returns every
/// matching row.
pub async fn get<T: Entity>(
    store: &dyn Store<T>,
    predicate: Option<Predicate>,
    page: i64,
    page_size: i64,
    filter: &str,
    includes: &[String],
) -> Result<PageEnvelope<T>, CrudError> {
    let mut matching = Query::<T>::new().filter(build_text_filter::<T>(filter)?);
    if let Some(predicate) = predicate {
        matching = matching.filter(predicate);
    }

    let row_count = store.count(&matching).await?;

    let mut windowed = matching;
    if page != ALL_PAGES {
        let size = usize::try_from(page_size).unwrap_or(0);
        let index = usize::try_from(page.saturating_sub(1)).unwrap_or(0);
        windowed = windowed.skip(index.saturating_mul(size)).take(size);
    }
    for path in includes {
        windowed = windowed.include(path.as_str());
    }

    let items = store.fetch(&windowed).await?;

    tracing::debug!(
        entity_type = T::type_name(),
        page,
        page_size,
        row_count,
        returned = items.len(),
        "paged query"
    );

    Ok(PageEnvelope::new(page, page_size, row_count, items))
}
