//! Pagination and sorting contract for catalog reads.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// Sort field for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Price,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A page request: zero-based page number, page size, and ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
    pub sort_by: ProductSort,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: 20,
            sort_by: ProductSort::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    /// Offset of the first row of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number) * u64::from(self.page_size)
    }
}

/// One page of products plus page metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub content: Vec<Product>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub last: bool,
}

impl ProductPage {
    /// Assembles a page from its content and the total row count.
    pub fn new(content: Vec<Product>, request: &PageRequest, total_elements: u64) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = total_elements.div_ceil(u64::from(page_size)) as u32;
        Self {
            content,
            page_number: request.page_number,
            page_size: request.page_size,
            total_elements,
            total_pages,
            last: request.page_number + 1 >= total_pages.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let request = PageRequest {
            page_number: 3,
            page_size: 10,
            ..PageRequest::default()
        };
        assert_eq!(request.offset(), 30);
    }

    #[test]
    fn test_page_metadata() {
        let request = PageRequest {
            page_number: 0,
            page_size: 10,
            ..PageRequest::default()
        };
        let page = ProductPage::new(Vec::new(), &request, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.last);

        let last_request = PageRequest {
            page_number: 2,
            ..request
        };
        let last_page = ProductPage::new(Vec::new(), &last_request, 25);
        assert!(last_page.last);
    }

    #[test]
    fn test_empty_result_is_last_page() {
        let page = ProductPage::new(Vec::new(), &PageRequest::default(), 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.last);
    }
}
