//! Pagination state
//!
//! Tracks one fetch loop's cursor, budget and counters.

use super::budget::Budget;

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Records still permitted
    pub budget: Budget,
    /// Continuation token for the next request
    pub cursor: Option<String>,
    /// Pages fetched so far
    pub pages_fetched: u64,
    /// Records handed to the consumer so far
    pub records_delivered: u64,
}

impl PaginationState {
    /// Create a new state from a signed limit
    pub fn new(limit: i64) -> Self {
        Self {
            budget: Budget::from_limit(limit),
            ..Default::default()
        }
    }

    /// Check if the budget is spent
    pub fn is_exhausted(&self) -> bool {
        self.budget.is_exhausted()
    }

    /// Negotiate the next page size, charging it against the budget
    pub fn negotiate(&mut self, default_size: u32) -> u32 {
        let (size, remaining) = self.budget.negotiate(default_size);
        self.budget = remaining;
        size
    }

    /// Set cursor
    pub fn set_cursor(&mut self, cursor: Option<String>) {
        self.cursor = cursor;
    }

    /// Count a fetched page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Count a delivered record
    pub fn add_delivered(&mut self) {
        self.records_delivered += 1;
    }

    /// Check if nothing has been delivered yet
    pub fn nothing_delivered(&self) -> bool {
        self.records_delivered == 0
    }
}
