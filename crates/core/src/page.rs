//! Pagination over read-only listings.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A 1-based page request.
///
/// Both values are strictly positive; construction rejects zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    page_number: usize,
    page_size: usize,
}

impl Pagination {
    pub fn new(page_number: usize, page_size: usize) -> DomainResult<Self> {
        if page_number == 0 {
            return Err(DomainError::validation("page_number must be greater than zero"));
        }
        if page_size == 0 {
            return Err(DomainError::validation("page_size must be greater than zero"));
        }
        Ok(Self {
            page_number,
            page_size,
        })
    }

    /// Build from optional caller parameters; paging only applies when both are given.
    pub fn from_optional(
        page_number: Option<usize>,
        page_size: Option<usize>,
    ) -> DomainResult<Option<Self>> {
        match (page_number, page_size) {
            (Some(n), Some(s)) => Self::new(n, s).map(Some),
            (Some(0), None) | (None, Some(0)) => {
                Err(DomainError::validation("pagination values must be greater than zero"))
            }
            _ => Ok(None),
        }
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Slice one page out of an ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = (self.page_number - 1).saturating_mul(self.page_size);
        items.into_iter().skip(skip).take(self.page_size).collect()
    }
}

/// Apply an optional page to a list (identity when `None`).
pub fn paginate<T>(items: Vec<T>, page: Option<Pagination>) -> Vec<T> {
    match page {
        Some(p) => p.apply(items),
        None => items,
    }
}
