//! 分页相关的数据结构

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PaginationParams {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    /// 页码从 1 开始; page_size 限制在 [1, MAX_PAGE_SIZE]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.map(u64::from).unwrap_or(1).max(1),
            page_size: per_page
                .map(u64::from)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// sea-orm Paginator 使用从 0 开始的页码
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: PaginationParams, total: u64) -> Self {
        Self {
            data,
            page: params.page,
            page_size: params.page_size,
            total,
            total_pages: total.div_ceil(params.page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_clamped() {
        let p = PaginationParams::new(Some(0), Some(1000));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
        assert_eq!(p.page_index(), 0);

        let p = PaginationParams::new(None, None);
        assert_eq!(p.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages() {
        let p = PaginationParams::new(Some(2), Some(10));
        let resp = PaginatedResponse::new(vec![1, 2, 3], p, 23);
        assert_eq!(resp.total_pages, 3);
        let resp: PaginatedResponse<i32> = PaginatedResponse::new(vec![], p, 0);
        assert_eq!(resp.total_pages, 0);
    }
}
