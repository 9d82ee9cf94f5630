//! Pagination arithmetic for the row explorer

use bd_data::PageKey;

/// Summary handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub current_page: usize,
    pub total_pages: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

/// Explorer window over a source with `total` rows.
///
/// `skip` only ever moves by whole pages, so it stays a multiple of `limit`
/// as long as it started at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    skip: usize,
    limit: usize,
    total: usize,
}

impl Pagination {
    /// Start at the first page; a zero limit is treated as one
    pub fn new(limit: usize) -> Self {
        Self {
            skip: 0,
            limit: limit.max(1),
            total: 0,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Update the row count, e.g. from a freshly loaded page
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Cache key of the current window
    pub fn key(&self) -> PageKey {
        PageKey::new(self.skip, self.limit)
    }

    /// 1-based page number, or 0 for an empty source
    pub fn current_page(&self) -> usize {
        if self.total > 0 {
            self.skip / self.limit + 1
        } else {
            0
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.total > 0 {
            self.total.div_ceil(self.limit)
        } else {
            0
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.skip > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.skip + self.limit < self.total
    }

    /// Skip of the previous page, if there is one
    pub fn previous(&self) -> Option<usize> {
        self.skip.checked_sub(self.limit)
    }

    /// Skip of the next page, if there is one
    pub fn next(&self) -> Option<usize> {
        let skip = self.skip + self.limit;
        (skip < self.total).then_some(skip)
    }

    /// Move back one page; `None` leaves the window untouched
    pub fn go_previous(&mut self) -> Option<PageKey> {
        self.skip = self.previous()?;
        Some(self.key())
    }

    /// Move forward one page; `None` leaves the window untouched
    pub fn go_next(&mut self) -> Option<PageKey> {
        self.skip = self.next()?;
        Some(self.key())
    }

    /// Change the page size, returning to the first page
    pub fn set_limit(&mut self, limit: usize) -> PageKey {
        self.limit = limit.max(1);
        self.skip = 0;
        self.key()
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            current_page: self.current_page(),
            total_pages: self.total_pages(),
            can_go_previous: self.can_go_previous(),
            can_go_next: self.can_go_next(),
        }
    }
}
