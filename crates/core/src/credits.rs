//! Credit balance and optimistic updates.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A user's remaining generation credits. Never negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CreditBalance(u32);

impl CreditBalance {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(credits: u32) -> Self {
        Self(credits)
    }

    /// Build a balance from a database integer, clamping negatives to zero.
    #[must_use]
    pub fn from_stored(credits: i32) -> Self {
        Self(u32::try_from(credits).unwrap_or(0))
    }

    /// Value suitable for an `INTEGER` column.
    #[must_use]
    pub fn to_stored(self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether at least one generation can be paid for.
    #[must_use]
    pub const fn has_credits(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Balance after one generation, saturating at zero.
    #[must_use]
    pub const fn spend_one(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Balance after a top-up.
    #[must_use]
    pub const fn add(self, credits: u32) -> Self {
        Self(self.0.saturating_add(credits))
    }
}

impl fmt::Display for CreditBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CreditBalance {
    fn from(credits: u32) -> Self {
        Self(credits)
    }
}

/// A change applied to local state ahead of server confirmation.
///
/// `apply` swaps the new value into the slot and keeps the old one. The
/// caller then either commits (drops the old value) or rolls back (puts it
/// back exactly).
///
/// ```
/// use fitting_room_core::Tentative;
///
/// let mut credits = 3_u32;
/// let change = Tentative::apply(&mut credits, 2);
/// assert_eq!(credits, 2);
/// change.rollback(&mut credits);
/// assert_eq!(credits, 3);
/// ```
#[derive(Debug)]
#[must_use = "a tentative change must be committed or rolled back"]
pub struct Tentative<T> {
    previous: T,
}

impl<T> Tentative<T> {
    /// Write `next` into `slot`, remembering what was there.
    pub fn apply(slot: &mut T, next: T) -> Self {
        Self {
            previous: core::mem::replace(slot, next),
        }
    }

    /// The value before the change.
    pub const fn previous(&self) -> &T {
        &self.previous
    }

    /// Accept the change.
    pub fn commit(self) {}

    /// Restore the value from before the change.
    pub fn rollback(self, slot: &mut T) {
        *slot = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_one_saturates() {
        assert_eq!(CreditBalance::new(2).spend_one(), CreditBalance::new(1));
        assert_eq!(CreditBalance::ZERO.spend_one(), CreditBalance::ZERO);
    }

    #[test]
    fn test_stored_conversion_clamps() {
        assert_eq!(CreditBalance::from_stored(-4), CreditBalance::ZERO);
        assert_eq!(CreditBalance::from_stored(7).get(), 7);
        assert_eq!(CreditBalance::new(u32::MAX).to_stored(), i32::MAX);
    }

    #[test]
    fn test_add_and_has_credits() {
        let balance = CreditBalance::ZERO;
        assert!(!balance.has_credits());
        assert!(balance.add(10).has_credits());
        assert_eq!(balance.add(10).get(), 10);
    }

    #[test]
    fn test_tentative_rollback_restores_exact_value() {
        let mut balance = CreditBalance::new(1);
        let next = balance.spend_one();
        let change = Tentative::apply(&mut balance, next);
        assert_eq!(balance, CreditBalance::ZERO);
        assert_eq!(change.previous(), &CreditBalance::new(1));
        change.rollback(&mut balance);
        assert_eq!(balance, CreditBalance::new(1));
    }

    #[test]
    fn test_tentative_on_collections() {
        let mut models = vec!["a", "b", "c"];
        let remaining: Vec<_> = models.iter().copied().filter(|m| *m != "b").collect();
        let change = Tentative::apply(&mut models, remaining);
        assert_eq!(models, ["a", "c"]);
        change.rollback(&mut models);
        assert_eq!(models, ["a", "b", "c"]);

        let change = Tentative::apply(&mut models, vec!["z"]);
        change.commit();
        assert_eq!(models, ["z"]);
    }
}
