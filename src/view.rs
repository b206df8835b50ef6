use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::ROWS_PER_PAGE;
use crate::table::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Sort, search and paging controls. Only the controls are stored, the visible
/// rows are derived from them on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub search_query: String,
    pub current_page: usize,
    rows_per_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(ROWS_PER_PAGE)
    }
}

impl ViewState {
    pub fn new(rows_per_page: usize) -> Self {
        ViewState {
            sort_by: None,
            sort_direction: SortDirection::Ascending,
            search_query: String::new(),
            current_page: 0,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page.max(1)
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        self.rows_per_page = rows_per_page.max(1);
    }

    /// A new query always starts over on the first page.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.current_page = 0;
    }

    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page;
    }
}

/// The rows a caller should render for the current view.
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    pub rows: Vec<&'a Row>,
    pub total_matches: usize,
    pub page_count: usize,
    pub current_page: usize,
}

/// Keeps rows where any cell contains `query`, ignoring case. Order is preserved.
pub fn filter_rows<'a>(rows: &'a [Row], query: &str) -> Vec<&'a Row> {
    if query.is_empty() {
        return rows.iter().collect();
    }
    let needle = query.to_lowercase();
    rows.par_iter()
        .filter(|row| {
            row.cells()
                .any(|cell| cell.to_string().to_lowercase().contains(&needle))
        })
        .collect()
}

/// Slices one page out of `rows`. Pages past the end are empty.
pub fn paginate<'a>(rows: &[&'a Row], page: usize, rows_per_page: usize) -> Vec<&'a Row> {
    let begin = page.saturating_mul(rows_per_page);
    if begin >= rows.len() {
        return Vec::new();
    }
    let end = std::cmp::min(begin.saturating_add(rows_per_page), rows.len());
    rows[begin..end].to_vec()
}

pub fn page_count(matches: usize, rows_per_page: usize) -> usize {
    matches.div_ceil(rows_per_page.max(1))
}

/// Filter then paginate. Rows arrive in store order, which already reflects the last sort.
pub fn project<'a>(rows: &'a [Row], view: &ViewState) -> Projection<'a> {
    let matches = filter_rows(rows, &view.search_query);
    let page = paginate(&matches, view.current_page, view.rows_per_page());
    trace!(
        "Projection: query {:?}, {} of {} rows match, page {} has {} rows",
        view.search_query,
        matches.len(),
        rows.len(),
        view.current_page,
        page.len()
    );
    Projection {
        total_matches: matches.len(),
        page_count: page_count(matches.len(), view.rows_per_page()),
        current_page: view.current_page,
        rows: page,
    }
}
