//! Pagination types shared by the history/search endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageSpec {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

fn default_page() -> u64 {
    0
}

fn default_size() -> u64 {
    20
}

impl Default for PageSpec {
    fn default() -> Self {
        PageSpec {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl PageSpec {
    pub const MAX_SIZE: u64 = 200;

    pub fn clamped(self) -> Self {
        PageSpec {
            page: self.page,
            size: self.size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page * self.size
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
}
