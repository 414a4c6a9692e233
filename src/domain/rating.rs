//! Rating aggregation rules
//!
//! A book's rating is the mean of every non-null `rate` among its relations,
//! rounded half-up to two decimal places. Recomputation is triggered after a
//! relation write when the relation is new or its `rate` changed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::DomainError;

pub const MIN_RATE: i32 = 1;
pub const MAX_RATE: i32 = 5;

/// Snapshot of a relation's user-editable fields
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationState {
    pub like: bool,
    pub in_bookmarks: bool,
    pub rate: Option<i32>,
}

/// Partial update of a relation. `rate: Some(None)` clears the rating.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelationPatch {
    pub like: Option<bool>,
    pub in_bookmarks: Option<bool>,
    pub rate: Option<Option<i32>>,
}

impl RelationPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(Some(rate)) = self.rate
            && !(MIN_RATE..=MAX_RATE).contains(&rate)
        {
            return Err(DomainError::Validation(format!(
                "rate: {} is not a valid choice, expected {}..={}",
                rate, MIN_RATE, MAX_RATE
            )));
        }
        Ok(())
    }

    /// The state that results from applying this patch to `state`
    pub fn apply(&self, state: RelationState) -> RelationState {
        RelationState {
            like: self.like.unwrap_or(state.like),
            in_bookmarks: self.in_bookmarks.unwrap_or(state.in_bookmarks),
            rate: self.rate.unwrap_or(state.rate),
        }
    }
}

/// Whether a relation write must recompute the book's rating.
///
/// `previous` is the persisted state before the write, `None` when the write
/// created the relation.
pub fn should_recompute(previous: Option<&RelationState>, current: &RelationState) -> bool {
    match previous {
        None => true,
        Some(prev) => prev.rate != current.rate,
    }
}

/// Arithmetic mean of `rates` rounded half-up to two decimal places,
/// `None` when nothing is rated.
pub fn mean_rating(rates: &[i32]) -> Option<Decimal> {
    if rates.is_empty() {
        return None;
    }
    let sum: i64 = rates.iter().map(|&r| i64::from(r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(rates.len());
    Some(mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
