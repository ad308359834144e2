use serde::{Deserialize, Serialize};

/// One page of a listing, as returned by the `/paged` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.number + 1 >= self.total_pages
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    /// "page 2/5 (42 total)" for status lines.
    pub fn position_display(&self) -> String {
        format!(
            "page {}/{} ({} total)",
            self.number + 1,
            self.total_pages.max(1),
            self.total_elements
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let json = r#"{"content": [1, 2, 3], "totalElements": 13, "totalPages": 5,
            "number": 4, "size": 3, "sort": {"sorted": false}}"#;
        let page: Page<i32> = serde_json::from_str(json).expect("parse page");
        assert_eq!(page.content, vec![1, 2, 3]);
        assert!(page.is_last());
        assert!(!page.is_first());
        assert_eq!(page.position_display(), "page 5/5 (13 total)");
    }

    #[test]
    fn test_empty_page() {
        let page: Page<i32> = serde_json::from_str("{}").expect("parse empty page");
        assert!(page.content.is_empty());
        assert!(page.is_first());
        assert!(page.is_last());
        assert_eq!(page.position_display(), "page 1/1 (0 total)");
    }
}
