use derive_more::{Add, AddAssign, Display, From, Into, Neg, Sub, SubAssign, Sum};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Amount of money in paise (1/100 rupee). Stored as an integer so ledger sums are exact.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    From,
    Into,
    Display,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Neg,
    Sum,
)]
#[serde(transparent)]
pub struct Paise(i64);

impl Paise {
    pub const ZERO: Paise = Paise(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }
    pub const fn value(self) -> i64 {
        self.0
    }
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
    /// Magnitude, saturating at `i64::MAX` for `i64::MIN`.
    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn checked_add(self, other: Paise) -> Option<Paise> {
        self.0.checked_add(other.0).map(Self)
    }
    pub fn checked_sub(self, other: Paise) -> Option<Paise> {
        self.0.checked_sub(other.0).map(Self)
    }
    /// Sum of `amounts`. Fails as soon as a partial sum leaves the `i64` range.
    pub fn try_sum(amounts: impl IntoIterator<Item = Paise>) -> Result<Paise, DomainError> {
        amounts.into_iter().try_fold(Paise::ZERO, |total, amount| {
            total
                .checked_add(amount)
                .ok_or(DomainError::Overflow { total, amount })
        })
    }

    /// `percentage` percent of this amount, rounded half away from zero to whole paise.
    pub fn percent(self, percentage: Decimal) -> Paise {
        let raw = Decimal::from(self.0) * percentage / Decimal::ONE_HUNDRED;
        let rounded = raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        // A percentage of an i64 amount only overflows for percentages far beyond 100.
        Paise(rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        }))
    }
}
