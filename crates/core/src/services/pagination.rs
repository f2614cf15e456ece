//! Page-number pagination.

use hasker_common::{AppError, AppResult};
use serde::Serialize;

/// A requested page: a 1-based number or the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl PageNumber {
    /// Parse a `page` query value. Missing means page 1; garbage is a 404.
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("last") => Ok(Self::Last),
            Some(s) => s
                .parse::<u64>()
                .map(Self::Number)
                .map_err(|_| AppError::NotFound(format!("Invalid page: {s}"))),
        }
    }
}

/// Bounds of one page within a list of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub num_pages: u64,
}

impl PageWindow {
    /// Resolve `number` against `total`. An empty list still has page 1.
    pub fn resolve(number: PageNumber, per_page: u64, total: u64) -> AppResult<Self> {
        let per_page = per_page.max(1);
        let num_pages = total.div_ceil(per_page).max(1);
        let page = match number {
            PageNumber::Last => num_pages,
            PageNumber::Number(n) => n,
        };

        if page == 0 || page > num_pages {
            return Err(AppError::NotFound(format!(
                "Page {page} out of range (1..={num_pages})"
            )));
        }

        Ok(Self {
            page,
            per_page,
            total,
            num_pages,
        })
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page
    }
}

/// A page of items with navigation metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            page: window.page,
            num_pages: window.num_pages,
            total: window.total,
            has_next: window.page < window.num_pages,
            has_previous: window.page > 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(PageNumber::parse(None).unwrap(), PageNumber::Number(1));
        assert_eq!(PageNumber::parse(Some("3")).unwrap(), PageNumber::Number(3));
        assert_eq!(PageNumber::parse(Some("last")).unwrap(), PageNumber::Last);
        assert!(matches!(
            PageNumber::parse(Some("abc")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_list_has_first_page() {
        let window = PageWindow::resolve(PageNumber::Number(1), 20, 0).unwrap();
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset(), 0);

        let page: Page<u8> = Page::new(vec![], window);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_page_beyond_last_is_not_found() {
        assert!(PageWindow::resolve(PageNumber::Number(3), 20, 40).is_err());
        assert!(PageWindow::resolve(PageNumber::Number(0), 20, 40).is_err());
    }

    #[test]
    fn test_window_math() {
        let window = PageWindow::resolve(PageNumber::Number(2), 20, 41).unwrap();
        assert_eq!(window.num_pages, 3);
        assert_eq!(window.offset(), 20);
        assert_eq!(window.limit(), 20);

        let last = PageWindow::resolve(PageNumber::Last, 20, 41).unwrap();
        assert_eq!(last.page, 3);

        let page = Page::new(vec![1, 2], window);
        assert!(page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_serialized_shape() {
        let window = PageWindow::resolve(PageNumber::Number(1), 25, 1).unwrap();
        let json = serde_json::to_value(Page::new(vec!["a"], window)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": ["a"],
                "page": 1,
                "numPages": 1,
                "total": 1,
                "hasNext": false,
                "hasPrevious": false
            })
        );
    }
}
