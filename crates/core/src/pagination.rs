//! Page resolution for store listings.
//!
//! The repository answers any page it is asked for (an out-of-range page is
//! simply empty). Deciding what a requested page number *means* happens
//! here, so the web layer and tests share one policy.

/// Stores shown per listing page.
pub const DEFAULT_PAGE_SIZE: i64 = 4;

/// How a requested page number should be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResolution {
    /// Page numbers below 1 are never queried; send the client to page 1.
    RedirectToFirst,
    /// Serve the requested page as-is.
    Serve { page: i64, pages: i64 },
    /// The requested page is past the end; serve the last page instead and
    /// tell the user.
    Clamp {
        requested: i64,
        page: i64,
        pages: i64,
    },
}

impl PageResolution {
    /// Notice shown when a page had to be clamped.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Clamp {
                requested, page, ..
            } => Some(format!(
                "Hey! You asked for page {requested}. But that page doesn't exist. So I put you on page {page}"
            )),
            _ => None,
        }
    }
}

/// Number of pages needed for `total` items, `ceil(total / size)`.
///
/// A non-positive `size` is treated as 1.
#[must_use]
pub const fn page_count(total: i64, size: i64) -> i64 {
    let size = if size < 1 { 1 } else { size };
    if total <= 0 { 0 } else { (total + size - 1) / size }
}

/// Zero-based row offset of a 1-based page.
#[must_use]
pub const fn offset(page: i64, size: i64) -> i64 {
    if page <= 1 { 0 } else { (page - 1).saturating_mul(size) }
}

/// Decide how to serve `requested` given `total` stores.
///
/// An empty directory serves page 1 (empty) rather than clamping to page 0.
#[must_use]
pub const fn resolve_page(requested: i64, total: i64, size: i64) -> PageResolution {
    if requested < 1 {
        return PageResolution::RedirectToFirst;
    }
    let pages = page_count(total, size);
    if pages == 0 {
        return PageResolution::Serve { page: 1, pages: 0 };
    }
    if requested > pages {
        return PageResolution::Clamp {
            requested,
            page: pages,
            pages,
        };
    }
    PageResolution::Serve {
        page: requested,
        pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 4), 0);
        assert_eq!(page_count(1, 4), 1);
        assert_eq!(page_count(4, 4), 1);
        assert_eq!(page_count(5, 4), 2);
        assert_eq!(page_count(9, 4), 3);
        assert_eq!(page_count(3, 0), 3);
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 4), 0);
        assert_eq!(offset(2, 4), 4);
        assert_eq!(offset(3, 4), 8);
        assert_eq!(offset(0, 4), 0);
    }

    #[test]
    fn test_resolve_below_range_redirects() {
        assert_eq!(resolve_page(0, 10, 4), PageResolution::RedirectToFirst);
        assert_eq!(resolve_page(-3, 10, 4), PageResolution::RedirectToFirst);
    }

    #[test]
    fn test_resolve_in_range() {
        assert_eq!(
            resolve_page(2, 10, 4),
            PageResolution::Serve { page: 2, pages: 3 }
        );
        assert_eq!(resolve_page(2, 10, 4).notice(), None);
    }

    #[test]
    fn test_resolve_beyond_range_clamps_with_notice() {
        let resolution = resolve_page(7, 10, 4);
        assert_eq!(
            resolution,
            PageResolution::Clamp {
                requested: 7,
                page: 3,
                pages: 3
            }
        );
        assert_eq!(
            resolution.notice().as_deref(),
            Some("Hey! You asked for page 7. But that page doesn't exist. So I put you on page 3")
        );
    }

    #[test]
    fn test_resolve_empty_directory_serves_first_page() {
        assert_eq!(
            resolve_page(1, 0, 4),
            PageResolution::Serve { page: 1, pages: 0 }
        );
        assert_eq!(
            resolve_page(5, 0, 4),
            PageResolution::Serve { page: 1, pages: 0 }
        );
    }

    #[test]
    fn test_pages_cover_every_item_once() {
        for total in 0..=13 {
            let pages = page_count(total, DEFAULT_PAGE_SIZE);
            let mut seen = 0;
            for page in 1..=pages {
                let start = offset(page, DEFAULT_PAGE_SIZE);
                let len = (total - start).min(DEFAULT_PAGE_SIZE);
                assert!(len > 0, "page {page} of {pages} empty for total {total}");
                seen += len;
            }
            assert_eq!(seen, total);
        }
    }
}
