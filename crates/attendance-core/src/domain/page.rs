//! 목록 조회 페이지네이션.

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// 서버에서 보정된 페이지 요청.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    /// 클라이언트 요청 값을 보정합니다.
    ///
    /// limit이 없으면 기본값, 1 미만이면 1, 최대값보다 크면 최대값.
    /// 음수 offset은 0으로 취급합니다.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>, config: &PaginationConfig) -> Self {
        let max = config.max_limit.max(1);
        let limit = match limit {
            Some(requested) => requested.clamp(1, i64::from(max)) as u32,
            None => config.default_limit.clamp(1, max),
        };
        Self {
            limit,
            offset: offset.map_or(0, |o| o.max(0) as u64),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::clamped(None, None, &PaginationConfig::default())
    }
}

/// 목록 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let page = PageRequest::clamped(None, None, &PaginationConfig::default());
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_zero_limit_becomes_one() {
        let page = PageRequest::clamped(Some(0), Some(5), &PaginationConfig::default());
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset, 5);
    }

    #[test]
    fn test_large_limit_clamped() {
        let page = PageRequest::clamped(Some(10_000_000_000), None, &PaginationConfig::default());
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn test_negative_values_saturate() {
        let page = PageRequest::clamped(Some(-5), Some(-20), &PaginationConfig::default());
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset, 0);
    }

    proptest! {
        #[test]
        fn limit_always_within_bounds(limit in proptest::option::of(any::<i64>()), offset in any::<i64>()) {
            let config = PaginationConfig::default();
            let page = PageRequest::clamped(limit, Some(offset), &config);
            prop_assert!(page.limit >= 1);
            prop_assert!(page.limit <= config.max_limit);
            prop_assert_eq!(page.offset, offset.max(0) as u64);
        }
    }
}
