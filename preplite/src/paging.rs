// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pagination engine
//!
//! Two independent strategies for two consumption patterns:
//! - Page-number pagination over a fully materialized filtered list
//! - Cursor pagination over a sorted key for infinite-scroll consumers

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// One page-number-mode result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// One cursor-mode result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Page-number pagination over a materialized list
///
/// `total_pages` is at least 1 even for an empty list, and the requested
/// page is clamped into `[1, total_pages]` instead of erroring, so a page
/// link that outlived a shrinking collection still renders the last page.
/// Identical inputs always produce identical output.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize, max_page_size: usize) -> Page<T> {
    let size = page_size.clamp(1, max_page_size.max(1));
    if size != page_size {
        log::debug!("page_size {} clamped to {}", page_size, size);
    }

    let total_items = items.len();
    let total_pages = std::cmp::max(1, total_items.div_ceil(size));
    let current_page = page.clamp(1, total_pages);

    let start = (current_page - 1) * size;
    let page_items: Vec<T> = items.into_iter().skip(start).take(size).collect();

    Page {
        items: page_items,
        total_items,
        total_pages,
        current_page,
    }
}

/// Cursor pagination over a list sorted ascending by `key_of`
///
/// Returns up to `page_size` records whose key is strictly greater than the
/// cursor. Records that sort at or before the cursor are skipped even if
/// they were inserted after the cursor was handed out, so a concurrent
/// insertion can never cause a record to be returned twice.
pub fn cursor_paginate<T, F>(
    items: Vec<T>,
    cursor: Option<&str>,
    page_size: usize,
    max_page_size: usize,
    key_of: F,
) -> CatalogResult<CursorPage<T>>
where
    F: Fn(&T) -> &str,
{
    if page_size == 0 || page_size > max_page_size {
        return Err(CatalogError::Validation(format!(
            "page_size must be within [1, {}], got {}",
            max_page_size, page_size
        )));
    }

    let mut out = Vec::with_capacity(page_size);
    let mut has_more = false;

    for item in items {
        if let Some(cursor) = cursor {
            if key_of(&item) <= cursor {
                continue;
            }
        }
        if out.len() == page_size {
            has_more = true;
            break;
        }
        out.push(item);
    }

    let next_cursor = out.last().map(|item| key_of(item).to_string());

    Ok(CursorPage {
        items: out,
        has_more,
        next_cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("{}", (b'a' + i as u8) as char))
            .collect()
    }

    #[test]
    fn test_paginate_is_stable() {
        let first = paginate(letters(7), 2, 3, 50);
        let second = paginate(letters(7), 2, 3, 50);
        assert_eq!(first, second);
        assert_eq!(first.items, vec!["d", "e", "f"]);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.current_page, 2);
    }

    #[test]
    fn test_paginate_clamps_page_into_range() {
        let below = paginate(letters(5), 0, 2, 50);
        assert_eq!(below.current_page, 1);
        assert_eq!(below.items, vec!["a", "b"]);

        let beyond = paginate(letters(5), 99, 2, 50);
        assert_eq!(beyond.current_page, 3);
        assert_eq!(beyond.items, vec!["e"]);
    }

    #[test]
    fn test_paginate_empty_list_has_one_page() {
        let page = paginate(Vec::<String>::new(), 1, 10, 50);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_items, 0);
    }

    #[test]
    fn test_paginate_clamps_oversized_page_size() {
        let page = paginate(letters(10), 1, 500, 50);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_cursor_first_page_and_continuation() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let first = cursor_paginate(items.clone(), None, 2, 50, |s| s.as_str()).unwrap();
        assert_eq!(first.items, vec!["a", "b"]);
        assert!(first.has_more);
        assert_eq!(first.next_cursor.as_deref(), Some("b"));

        let second = cursor_paginate(items, Some("b"), 2, 50, |s| s.as_str()).unwrap();
        assert_eq!(second.items, vec!["c"]);
        assert!(!second.has_more);
        assert_eq!(second.next_cursor.as_deref(), Some("c"));
    }

    #[test]
    fn test_cursor_empty_tail_has_no_cursor() {
        let items = vec!["a".to_string()];
        let page = cursor_paginate(items, Some("z"), 2, 50, |s| s.as_str()).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_cursor_rejects_out_of_bounds_page_size() {
        let items = vec!["a".to_string()];
        assert!(cursor_paginate(items.clone(), None, 0, 50, |s| s.as_str()).is_err());
        assert!(cursor_paginate(items, None, 51, 50, |s| s.as_str()).is_err());
    }

    #[test]
    fn test_cursor_skips_records_inserted_before_cursor() {
        // "aa" sorts before the cursor "b" and must not be re-returned
        let items = vec!["a", "aa", "b", "c"]
            .into_iter()
            .map(String::from)
            .collect();
        let page = cursor_paginate(items, Some("b"), 10, 50, |s: &String| s.as_str()).unwrap();
        assert_eq!(page.items, vec!["c"]);
    }
}
