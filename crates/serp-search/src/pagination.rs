//! Result pagination.
//!
//! Page numbers are 1-based and never exceed [`MAX_PAGES`]. Malformed or
//! out-of-range input is normalized instead of rejected.

use serde::Serialize;

use serp_types::PaginationSettings;

/// Deepest page that can be requested.
pub const MAX_PAGES: u64 = 1000;

/// Pages shown before the current one in the navigation bar.
const PAGES_BEFORE: u64 = 4;
/// Pages shown after the current one in the navigation bar.
const PAGES_AFTER: u64 = 5;
/// Current page above which a link to the first page is shown.
const FIRST_LINK_AFTER: u64 = 5;

/// One navigation bar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavEntry {
    First,
    Previous { page: u64 },
    Page { number: u64, active: bool },
    Next { page: u64 },
}

/// Pagination state for one result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub results_per_page: u64,
    pub total_results: u64,
    pub navigation: Vec<NavEntry>,
}

/// Number of reachable pages for `total` results.
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    let per_page = per_page.max(1);
    total.div_ceil(per_page).clamp(1, MAX_PAGES)
}

/// Clamp the requested page and build the navigation entries.
pub fn page(total: u64, per_page: u64, requested: u64) -> PageInfo {
    let per_page = per_page.max(1);
    let pages = total_pages(total, per_page);
    let current = requested.clamp(1, pages);
    let navigation = if total == 0 {
        Vec::new()
    } else {
        navigation(current, pages)
    };

    PageInfo {
        current_page: current,
        total_pages: pages,
        results_per_page: per_page,
        total_results: total,
        navigation,
    }
}

/// Navigation entries around `current`.
pub fn navigation(current: u64, total_pages: u64) -> Vec<NavEntry> {
    let last = total_pages.clamp(1, MAX_PAGES);
    let current = current.clamp(1, last);

    let mut entries = Vec::new();
    if current > FIRST_LINK_AFTER {
        entries.push(NavEntry::First);
    }
    if current > 1 {
        entries.push(NavEntry::Previous { page: current - 1 });
    }

    let start = current.saturating_sub(PAGES_BEFORE).max(1);
    let end = (current + PAGES_AFTER).min(last);
    for number in start..=end {
        entries.push(NavEntry::Page {
            number,
            active: number == current,
        });
    }

    if current < last {
        entries.push(NavEntry::Next { page: current + 1 });
    }
    entries
}

/// Parse a page parameter; anything unusable becomes page 1.
pub fn parse_page(raw: &str) -> u64 {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Offset of the first result on `page`.
pub fn offset(page: u64, per_page: u64) -> u64 {
    (page.clamp(1, MAX_PAGES) - 1) * per_page
}

/// Pagination with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    results_per_page: u64,
}

impl Paginator {
    pub fn new(results_per_page: u64) -> Self {
        Self {
            results_per_page: results_per_page.max(1),
        }
    }

    pub fn from_settings(settings: &PaginationSettings) -> Self {
        Self::new(settings.results_per_page)
    }

    pub fn results_per_page(&self) -> u64 {
        self.results_per_page
    }

    pub fn page(&self, total: u64, requested: u64) -> PageInfo {
        page(total, self.results_per_page, requested)
    }

    pub fn offset(&self, page: u64) -> u64 {
        offset(page, self.results_per_page)
    }
}
