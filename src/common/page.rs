use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Items that can be merged by a stable key.
pub trait Identified {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

/// Pagination envelope shared by every paged endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    pub last: bool,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(number: u32, content: Vec<T>, last: bool) -> Self {
        let size = u32::try_from(content.len()).unwrap_or(u32::MAX);
        Self {
            empty: content.is_empty(),
            content,
            number,
            size,
            total_pages: 0,
            total_elements: 0,
            last,
            first: number == 0,
        }
    }

    /// An empty page counts as the end even when `last` is false,
    /// otherwise infinite scrolling keeps asking for more.
    pub fn is_exhausted(&self) -> bool {
        self.last || self.content.is_empty()
    }
}
