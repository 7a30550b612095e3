//! Catalog query, pagination, and text narrowing.
//!
//! The catalog is fetched one page at a time: the repository receives a
//! [`CatalogQuery`] (equality filters, descending creation-time order, a
//! `[offset, offset+limit)` window) and returns the page plus an exact
//! total matching-row count. [`Paginator`] derives the page count from that
//! total and keeps the current page in range. [`filter_notes`] narrows the
//! already-fetched page by a case-insensitive substring match.
//!
//! The text term narrows only the current page; it never reaches the server
//! query, so it does not change the total count and cannot surface matches
//! from other pages.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::{PAGE_SIZE, PAGE_WINDOW};
use crate::error::Error;
use crate::models::{Category, NoteSummary, StudyYear};

// =============================================================================
// FILTERS
// =============================================================================

/// Category selection: everything, or one fixed label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// The selected category, if the filter is narrower than "All".
    pub fn selected(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(c) => Some(*c),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(s.parse()?))
        }
    }
}

/// Study-year selection: everything, or one fixed label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Only(StudyYear),
}

impl YearFilter {
    /// The selected year, if the filter is narrower than "All".
    pub fn selected(&self) -> Option<StudyYear> {
        match self {
            YearFilter::All => None,
            YearFilter::Only(y) => Some(*y),
        }
    }
}

impl FromStr for YearFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(YearFilter::All)
        } else {
            Ok(YearFilter::Only(s.parse()?))
        }
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// A server-side catalog page request.
///
/// Rows are ordered by creation time descending and windowed to
/// `[(page - 1) * page_size, page * page_size - 1]`; the repository also
/// reports the exact count of rows matching the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    pub year: YearFilter,
    /// 1-based page index.
    pub page: u32,
    pub page_size: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            year: YearFilter::All,
            page: 1,
            page_size: PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    /// SQL-style window: `(offset, limit)`.
    pub fn window(&self) -> (i64, i64) {
        let page = self.page.max(1) as i64;
        let size = self.page_size.max(1) as i64;
        ((page - 1) * size, size)
    }
}

/// One fetched page of the catalog plus the exact matching-row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage {
    pub notes: Vec<NoteSummary>,
    pub total: i64,
}

// =============================================================================
// PAGINATION TRACKER
// =============================================================================

/// Total page count for a row count: `ceil(total / page_size)`, minimum 1.
pub fn total_pages(total: i64, page_size: u32) -> u32 {
    let size = page_size.max(1) as i64;
    let pages = (total.max(0) + size - 1) / size;
    pages.max(1) as u32
}

/// Tracks the current page and the page count reported by the server.
///
/// The current page is always within `[1, total_pages]`; moves outside that
/// range are inert, matching UI controls that disable at the boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: u32,
    total_pages: u32,
    page_size: u32,
}

impl Paginator {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            total_pages: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Recompute the page count from a server-reported row count and clamp
    /// the current page into range.
    pub fn observe_total(&mut self, total: i64) {
        self.total_pages = total_pages(total, self.page_size);
        if self.page > self.total_pages {
            self.page = self.total_pages;
        }
    }

    /// Move to `page`. Returns false (and stays put) outside
    /// `[1, total_pages]`.
    pub fn goto(&mut self, page: u32) -> bool {
        if page >= 1 && page <= self.total_pages {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Move to the next page; inert on the last page.
    pub fn next(&mut self) -> bool {
        self.goto(self.page + 1)
    }

    /// Move to the previous page; inert on the first page.
    pub fn prev(&mut self) -> bool {
        self.page > 1 && self.goto(self.page - 1)
    }

    /// Reset to the first page (filter changed).
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// The window of page numbers to render, at most [`PAGE_WINDOW`] wide,
    /// centered on the current page and shifted back at the tail.
    pub fn page_window(&self) -> std::ops::RangeInclusive<u32> {
        let mut start = self.page.saturating_sub(PAGE_WINDOW / 2).max(1);
        let end = (start + PAGE_WINDOW - 1).min(self.total_pages);
        if end - start + 1 < PAGE_WINDOW {
            start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
        }
        start..=end
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

// =============================================================================
// TEXT FILTER
// =============================================================================

/// Narrow a fetched page by a case-insensitive substring match on title,
/// description, or category label. An empty term retains every row.
pub fn filter_notes(notes: &[NoteSummary], term: &str) -> Vec<NoteSummary> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return notes.to_vec();
    }
    notes
        .iter()
        .filter(|n| {
            n.title.to_lowercase().contains(&needle)
                || n.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || n.category.as_str().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

// =============================================================================
// CATALOG STATE
// =============================================================================

/// Transient UI-side catalog state: selected filters, free-text term, and
/// pagination. Any filter or term change resets to page 1.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    category: CategoryFilter,
    year: YearFilter,
    term: String,
    paginator: Paginator,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn year(&self) -> YearFilter {
        self.year
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.paginator.reset();
    }

    pub fn set_year(&mut self, year: YearFilter) {
        self.year = year;
        self.paginator.reset();
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
        self.paginator.reset();
    }

    pub fn goto_page(&mut self, page: u32) -> bool {
        self.paginator.goto(page)
    }

    /// The server query for the current state. The free-text term is not
    /// part of it; it narrows the fetched page afterwards.
    pub fn query(&self) -> CatalogQuery {
        CatalogQuery {
            category: self.category,
            year: self.year,
            page: self.paginator.page(),
            page_size: self.paginator.page_size(),
        }
    }

    /// Fold a fetched page into the state and return the rows narrowed by
    /// the current term.
    pub fn apply_page(&mut self, page: CatalogPage) -> Vec<NoteSummary> {
        self.paginator.observe_total(page.total);
        filter_notes(&page.notes, &self.term)
    }
}
