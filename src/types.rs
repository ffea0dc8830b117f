/// Shared types used across the codebase

use serde::Serialize;

use crate::filter::{FilterData, FilterError, FilterOrder, SortWhitelist};

/// Requested page: 0-based `page`, `size` already capped, raw `sort` values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: Vec<String>,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self { page, size, sort: vec![] }
    }

    /// Row offset of the first element; `None` when it does not fit in an i64
    pub fn checked_offset(&self) -> Option<i64> {
        self.page.checked_mul(self.size)
    }

    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }

    /// LIMIT / OFFSET / ORDER BY for this page; sort properties must be in `allowed`
    pub fn to_filter_data(&self, allowed: SortWhitelist) -> Result<FilterData, FilterError> {
        Ok(FilterData {
            conditions: vec![],
            order: FilterOrder::validate_and_parse(&self.sort, allowed)?,
            limit: Some(self.size),
            offset: Some(self.offset()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub size: i64,
    pub number: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let total_pages = if request.size > 0 {
            (total_elements + request.size - 1) / request.size
        } else {
            0
        };
        Self {
            content,
            page: PageMeta {
                size: request.size,
                number: request.page,
                total_elements,
                total_pages,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_metadata() {
        let request = PageRequest::new(2, 10);
        assert_eq!(request.offset(), 20);

        let page = Page::new(vec![1, 2, 3], &request, 23);
        assert_eq!(page.page, PageMeta { size: 10, number: 2, total_elements: 23, total_pages: 3 });

        let far = PageRequest::new(i64::MAX / 2, 20);
        assert_eq!(far.checked_offset(), None);
        assert_eq!(far.offset(), i64::MAX);

        let empty: Page<i32> = Page::new(vec![], &PageRequest::new(0, 20), 0);
        assert_eq!(empty.page.total_pages, 0);
    }

    #[test]
    fn page_serializes_camel_case() {
        let page = Page::new(vec!["a"], &PageRequest::new(0, 5), 1).map(|s| s.to_uppercase());
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "content": ["A"],
                "page": {"size": 5, "number": 0, "totalElements": 1, "totalPages": 1}
            })
        );
    }

    #[test]
    fn filter_data_uses_whitelist() {
        let mut request = PageRequest::new(1, 5);
        request.sort = vec!["name,desc".to_string()];
        let data = request.to_filter_data(&[("name", "name")]).unwrap();
        assert_eq!((data.limit, data.offset), (Some(5), Some(5)));
        assert_eq!(data.order.len(), 1);

        request.sort = vec!["password".to_string()];
        assert!(request.to_filter_data(&[("name", "name")]).is_err());
    }
}
