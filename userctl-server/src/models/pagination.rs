//! Pagination types and continuation tokens

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Default items per page
pub const DEFAULT_LIMIT: u32 = 20;

/// Maximum items per page
pub const MAX_LIMIT: u32 = 100;

const TOKEN_PREFIX: &str = "offset:";

/// Resolved pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Items per page
    pub limit: u32,
    /// Rows to skip
    pub offset: u64,
}

impl Pagination {
    /// Create pagination; limit is clamped to at least 1.
    pub fn new(limit: u32, offset: u64) -> Self {
        Self {
            limit: limit.max(1),
            offset,
        }
    }

    /// Window for a 1-indexed page number.
    pub fn from_page(page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        Self::new(limit, u64::from(page - 1) * u64::from(limit))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

/// Invalid continuation token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid continuation token")]
pub struct TokenError;

/// Opaque continuation token locating the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageToken {
    pub offset: u64,
}

impl PageToken {
    pub fn new(offset: u64) -> Self {
        Self { offset }
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}{}", TOKEN_PREFIX, self.offset))
    }

    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| TokenError)?;
        let text = String::from_utf8(bytes).map_err(|_| TokenError)?;
        let offset = text
            .strip_prefix(TOKEN_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|&offset| i64::try_from(offset).is_ok())
            .ok_or(TokenError)?;
        Ok(Self { offset })
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items for the current page
    pub items: Vec<T>,
    /// Total matching rows, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    /// Token for the following page, absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Build a page, emitting a next token only if rows remain past it.
    pub fn new(items: Vec<T>, total: Option<i64>, window: Pagination) -> Self {
        let end = window.offset.saturating_add(items.len() as u64);
        let next_token = match total {
            Some(total) if !items.is_empty() && end < total.max(0) as u64 => {
                Some(PageToken::new(end).encode())
            }
            _ => None,
        };

        Self {
            items,
            total,
            next_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(Pagination::from_page(1, 10).offset, 0);
        assert_eq!(Pagination::from_page(2, 10).offset, 10);
        assert_eq!(Pagination::from_page(3, 25).offset, 50);
    }

    #[test]
    fn clamps_page_and_limit() {
        let p = Pagination::from_page(0, 0);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn token_decodes_what_it_encodes() {
        let token = PageToken::new(40).encode();
        assert_eq!(PageToken::decode(&token), Ok(PageToken::new(40)));
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert_eq!(PageToken::decode("not base64!"), Err(TokenError));
        // valid base64, wrong payload
        let token = URL_SAFE_NO_PAD.encode("cursor:12");
        assert_eq!(PageToken::decode(&token), Err(TokenError));
        let token = URL_SAFE_NO_PAD.encode("offset:-3");
        assert_eq!(PageToken::decode(&token), Err(TokenError));
    }

    #[test]
    fn rejects_offsets_past_i64() {
        let token = PageToken::new(u64::MAX).encode();
        assert_eq!(PageToken::decode(&token), Err(TokenError));

        let token = PageToken::new(i64::MAX as u64).encode();
        assert_eq!(PageToken::decode(&token).unwrap().offset, i64::MAX as u64);
    }

    #[test]
    fn next_token_only_when_rows_remain() {
        let page = Page::new(vec![1, 2], Some(5), Pagination::new(2, 0));
        let token = page.next_token.expect("more rows follow");
        assert_eq!(PageToken::decode(&token).unwrap().offset, 2);

        let last = Page::new(vec![5], Some(5), Pagination::new(2, 4));
        assert_eq!(last.next_token, None);

        let empty: Page<i32> = Page::new(vec![], None, Pagination::new(2, 10));
        assert_eq!(empty.next_token, None);
    }

    #[test]
    fn serializes_without_unknowns() {
        let page = Page::new(vec!["a"], Some(1), Pagination::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({"items": ["a"], "total": 1}));
    }
}
