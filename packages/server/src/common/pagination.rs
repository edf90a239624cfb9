//! Offset pagination shared by list endpoints.
//!
//! Pages are zero-based. `size` defaults to 20 and is capped at 100 so a
//! single request can never pull an unbounded result set. `page` is capped
//! at `MAX_PAGE` so the offset always fits in an `i64`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 100_000;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: Some(0),
            size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PageParams {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).clamp(0, MAX_PAGE)
    }

    pub fn size(&self) -> i64 {
        self.size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.size()
    }

    pub fn offset(&self) -> i64 {
        self.page() * self.size()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, params: PageParams, total_items: i64) -> Self {
        let size = params.size();
        Self {
            items,
            page: params.page(),
            size,
            total_items,
            total_pages: (total_items + size - 1) / size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page(), 0);
        assert_eq!(params.limit(), 20);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn clamps_size_and_negative_pages() {
        let params = PageParams::new(-3, 500);
        assert_eq!(params.page(), 0);
        assert_eq!(params.size(), MAX_PAGE_SIZE);

        let params = PageParams::new(2, 0);
        assert_eq!(params.size(), 1);
        assert_eq!(params.offset(), 2);
    }

    #[test]
    fn huge_page_numbers_are_capped() {
        let params = PageParams::new(i64::MAX / 50, 100);
        assert_eq!(params.page(), MAX_PAGE);
        assert_eq!(params.offset(), MAX_PAGE * MAX_PAGE_SIZE);

        let params: PageParams = serde_json::from_str(r#"{"page": 9223372036854775807}"#).unwrap();
        assert!(params.offset() > 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let paged = Paged::new(vec![1, 2, 3], PageParams::new(0, 3), 7);
        assert_eq!(paged.total_pages, 3);

        let empty: Paged<i32> = Paged::new(vec![], PageParams::new(0, 20), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn map_keeps_page_metadata() {
        let paged = Paged::new(vec![1, 2], PageParams::new(1, 2), 4).map(|n| n * 10);
        assert_eq!(paged.items, vec![10, 20]);
        assert_eq!(paged.page, 1);
        assert_eq!(paged.total_items, 4);
    }
}
