//! Page request and result shapes

use serde::Serialize;

use crate::error::{ApiError, Result};

// == Page Request ==
/// A window into a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub start: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(start: usize, limit: usize) -> Self {
        Self { start, limit }
    }

    /// First page of `limit` items.
    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    /// Offset one past the last requested item.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.limit)
    }

    /// Rejects windows the remote service cannot answer.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(ApiError::InvalidRequest(
                "page limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// == Result Page ==
/// One page of results with enough context to ask for the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    /// Items in server order
    pub items: Vec<T>,
    pub total_count: usize,
    /// True iff `start + limit < total_count`
    pub has_more: bool,
}

impl<T> ResultPage<T> {
    /// Builds a page, deriving `has_more` from the request window.
    pub fn new(items: Vec<T>, total_count: usize, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            has_more: request.end() < total_count,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> ResultPage<T> {
    /// Cuts the requested window out of a locally held batch.
    pub fn slice(batch: &[T], total_count: usize, request: PageRequest) -> Self {
        let start = request.start.min(batch.len());
        let end = request.end().min(batch.len());
        Self::new(batch[start..end].to_vec(), total_count, request)
    }
}
