use serde::Serialize;
use std::fmt;

/// The page sizes a user can pick from.
pub const PAGE_SIZES: [u64; 4] = [5, 10, 20, 50];

/// Pages shown before the strip collapses into ellipses.
const MAX_VISIBLE_PAGES: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Number(u64),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

impl PaginationInfo {
    /// A zero limit is treated as one. The page is clamped into range.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit);
        let page = page.clamp(1, total_pages.max(1));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Controls are only worth showing when there is more than one page.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    #[inline]
    pub fn prev_enabled(&self) -> bool {
        self.has_prev
    }

    #[inline]
    pub fn next_enabled(&self) -> bool {
        self.has_next
    }

    /// The page to move to, if `page` is a real page.
    pub fn request_page(&self, page: u64) -> Option<u64> {
        (1..=self.total_pages).contains(&page).then_some(page)
    }

    pub fn prev(&self) -> Option<u64> {
        self.has_prev.then(|| self.page - 1)
    }

    pub fn next(&self) -> Option<u64> {
        self.has_next.then(|| self.page + 1)
    }

    /// Page numbers to offer, collapsing long runs into ellipses.
    pub fn page_items(&self) -> Vec<PageItem> {
        use PageItem::*;
        let (page, last) = (self.page, self.total_pages);
        if last <= MAX_VISIBLE_PAGES {
            return (1..=last).map(Number).collect();
        }
        let mut items = Vec::with_capacity(7);
        if page <= 3 {
            items.extend((1..=4).map(Number));
            items.extend([Ellipsis, Number(last)]);
        } else if page >= last - 2 {
            items.extend([Number(1), Ellipsis]);
            items.extend((last - 3..=last).map(Number));
        } else {
            items.extend([Number(1), Ellipsis]);
            items.extend((page - 1..=page + 1).map(Number));
            items.extend([Ellipsis, Number(last)]);
        }
        items
    }

    /// First and last (1-based) positions on this page, e.g. `(11, 20)`.
    pub fn results_range(&self) -> (u64, u64) {
        if self.total == 0 {
            return (0, 0);
        }
        let first = (self.page - 1) * self.limit + 1;
        (first, (self.page * self.limit).min(self.total))
    }

    /// Index range of this page within the full list.
    pub fn slice_range(&self) -> std::ops::Range<usize> {
        let (first, last) = self.results_range();
        if first == 0 {
            return 0..0;
        }
        (first as usize - 1)..(last as usize)
    }
}

impl fmt::Display for PaginationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, last) = self.results_range();
        write!(f, "Showing {first} to {last} of {} results", self.total)?;
        if !self.is_visible() {
            return Ok(());
        }
        f.write_str("  ")?;
        f.write_str(if self.has_prev { "< Previous " } else { "  Previous " })?;
        for item in self.page_items() {
            match item {
                PageItem::Number(n) if n == self.page => write!(f, "[{n}] ")?,
                other => write!(f, "{other} ")?,
            }
        }
        f.write_str(if self.has_next { "Next >" } else { "Next  " })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_page_hides_controls() {
        let info = PaginationInfo::new(1, 10, 7);
        assert_eq!(info.total_pages, 1);
        assert!(!info.is_visible());
        assert!(!info.prev_enabled());
        assert!(!info.next_enabled());
        assert!(!PaginationInfo::new(1, 10, 0).is_visible());
    }

    #[test]
    fn buttons_disable_at_the_edges() {
        let first = PaginationInfo::new(1, 10, 25);
        assert!(first.is_visible());
        assert!(!first.prev_enabled());
        assert!(first.next_enabled());
        let last = PaginationInfo::new(3, 10, 25);
        assert!(last.prev_enabled());
        assert!(!last.next_enabled());
        assert_eq!(last.next(), None);
        assert_eq!(last.prev(), Some(2));
    }

    #[test]
    fn only_real_pages_can_be_requested() {
        let info = PaginationInfo::new(2, 10, 25);
        assert_eq!(info.request_page(0), None);
        assert_eq!(info.request_page(1), Some(1));
        assert_eq!(info.request_page(3), Some(3));
        assert_eq!(info.request_page(4), None);
    }

    #[test]
    fn short_strip_lists_every_page() {
        let info = PaginationInfo::new(2, 5, 25);
        assert_eq!(info.page_items(), (1..=5).map(Number).collect::<Vec<_>>());
    }

    #[test]
    fn long_strip_collapses_around_the_current_page() {
        assert_eq!(
            PaginationInfo::new(2, 10, 100).page_items(),
            [Number(1), Number(2), Number(3), Number(4), Ellipsis, Number(10)]
        );
        assert_eq!(
            PaginationInfo::new(9, 10, 100).page_items(),
            [Number(1), Ellipsis, Number(7), Number(8), Number(9), Number(10)]
        );
        assert_eq!(
            PaginationInfo::new(5, 10, 100).page_items(),
            [
                Number(1),
                Ellipsis,
                Number(4),
                Number(5),
                Number(6),
                Ellipsis,
                Number(10)
            ]
        );
    }

    #[test]
    fn range_of_the_last_partial_page() {
        let info = PaginationInfo::new(3, 10, 25);
        assert_eq!(info.results_range(), (21, 25));
        assert_eq!(info.slice_range(), 20..25);
        assert_eq!(PaginationInfo::new(1, 10, 0).slice_range(), 0..0);
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        assert_eq!(PaginationInfo::new(9, 10, 25).page, 3);
        assert_eq!(PaginationInfo::new(0, 10, 25).page, 1);
    }

    #[test]
    fn renders_a_control_line() {
        assert_eq!(
            PaginationInfo::new(2, 10, 25).to_string(),
            "Showing 11 to 20 of 25 results  < Previous 1 [2] 3 Next >"
        );
        assert_eq!(
            PaginationInfo::new(1, 10, 4).to_string(),
            "Showing 1 to 4 of 4 results"
        );
    }
}
