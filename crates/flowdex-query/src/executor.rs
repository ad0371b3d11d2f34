//! Query execution: scan, filter, order, paginate.

use flowdex_store::Tables;
use flowdex_types::{Stream, StreamActivity};

use crate::filter::{ActivityFilter, Page, ScanOrder, StreamFilter, StreamOrder};

/// Lists stream records matching `filter`.
///
/// Ordered by the chosen timestamp with the stream id as tiebreaker, so
/// identical timestamps still page deterministically.
pub fn list_streams(
    tables: &Tables,
    filter: &StreamFilter,
    order: StreamOrder,
    direction: ScanOrder,
    page: Page,
) -> Vec<Stream> {
    let mut rows: Vec<Stream> = tables
        .streams()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect();

    rows.sort_by_key(|s| {
        let key = match order {
            StreamOrder::CreatedAt => s.created_at,
            StreamOrder::UpdatedAt => s.updated_at,
        };
        (key, s.id)
    });
    if direction == ScanOrder::Descending {
        rows.reverse();
    }

    paginate(rows, page)
}

/// Lists activity records matching `filter`.
///
/// Ordered by timestamp with the source event position as tiebreaker;
/// dashboards read the log newest-first, so pass
/// [`ScanOrder::Descending`] for that view.
pub fn list_activities(
    tables: &Tables,
    filter: &ActivityFilter,
    direction: ScanOrder,
    page: Page,
) -> Vec<StreamActivity> {
    let mut rows: Vec<StreamActivity> = tables
        .activities()
        .filter(|a| filter.matches(a))
        .cloned()
        .collect();

    rows.sort_by_key(|a| (a.timestamp, a.position, a.id));
    if direction == ScanOrder::Descending {
        rows.reverse();
    }

    paginate(rows, page)
}

fn paginate<T>(rows: Vec<T>, page: Page) -> Vec<T> {
    rows.into_iter().skip(page.offset).take(page.limit).collect()
}
