use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Resolved page of a filtered collection. Pages are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: usize,
    pub total_pages: usize,
    pub offset: usize,
    /// Records on this page
    pub len: usize,
}

/// Map a collection size, page size and requested page to a window.
///
/// There is always at least one page. Out-of-range requests clamp to the
/// nearest bound, and a zero page size is treated as 1.
pub fn paginate(count: usize, page_size: usize, requested: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = count.div_ceil(page_size).max(1);
    let page = requested.clamp(1, total_pages);
    let offset = (page - 1) * page_size;
    let len = count.saturating_sub(offset).min(page_size);

    PageWindow {
        page,
        total_pages,
        offset,
        len,
    }
}

impl PageWindow {
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = (self.offset + self.len).min(items.len());
        &items[start..end]
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// One page of records plus the window that produced it.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    #[serde(flatten)]
    pub window: PageWindow,
}

/// Requested page that follows a filter: whenever the filter changes, the
/// request goes back to page 1.
#[derive(Clone, Debug)]
pub struct PageCursor {
    page_size: usize,
    requested: usize,
    fingerprint: Option<u64>,
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            requested: 1,
            fingerprint: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn go_to(&mut self, page: usize) {
        self.requested = page.max(1);
    }

    pub fn next(&mut self) {
        self.requested = self.requested.saturating_add(1);
    }

    pub fn previous(&mut self) {
        self.requested = self.requested.saturating_sub(1).max(1);
    }

    /// Resolve the current request against `filter` and the size of the
    /// collection it matched. The clamped page is kept as the new request.
    pub fn resolve<F: Hash>(&mut self, filter: &F, count: usize) -> PageWindow {
        let mut hasher = DefaultHasher::new();
        filter.hash(&mut hasher);
        let fingerprint = hasher.finish();

        if self.fingerprint.is_some_and(|previous| previous != fingerprint) {
            debug!(from_page = self.requested, "Filter changed, resetting to first page");
            self.requested = 1;
        }
        self.fingerprint = Some(fingerprint);

        let window = paginate(count, self.page_size, self.requested);
        self.requested = window.page;
        window
    }
}
