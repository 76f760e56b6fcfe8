//! Record budget and page-size negotiation

use crate::types::UNBOUNDED_LIMIT;

/// Number of records a fetch loop may still deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Budget {
    /// No limit
    #[default]
    Unbounded,
    /// This many records left
    Remaining(u64),
}

impl Budget {
    /// Build a budget from a signed limit, any negative value meaning unbounded
    pub fn from_limit(limit: i64) -> Self {
        u64::try_from(limit).map_or(Self::Unbounded, Self::Remaining)
    }

    /// The signed limit this budget stands for
    pub fn as_limit(&self) -> i64 {
        match self {
            Self::Unbounded => UNBOUNDED_LIMIT,
            Self::Remaining(n) => i64::try_from(*n).unwrap_or(i64::MAX),
        }
    }

    /// Check if the budget allows no more records
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Remaining(0))
    }

    /// Check if the budget is unbounded
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Compute the next request size and the budget left after it
    ///
    /// The caller must stop before negotiating an exhausted budget; doing so
    /// yields a request size of 0.
    pub fn negotiate(self, default_size: u32) -> (u32, Self) {
        match self {
            Self::Unbounded => (default_size, Self::Unbounded),
            Self::Remaining(left) if u64::from(default_size) > left => {
                // left < default_size <= u32::MAX
                (left as u32, Self::Remaining(0))
            }
            Self::Remaining(left) => (
                default_size,
                Self::Remaining(left - u64::from(default_size)),
            ),
        }
    }
}

impl From<i64> for Budget {
    fn from(limit: i64) -> Self {
        Self::from_limit(limit)
    }
}
