//! Credit package pricing using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
}

/// A purchasable bundle of generation credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditPackage {
    /// Number of credits granted on payment.
    pub credits: u32,
    /// Display name.
    pub name: &'static str,
    /// Short marketing line.
    pub description: &'static str,
    /// Price charged at checkout, in US cents.
    pub price_cents: i64,
    /// Highlighted in the purchase dialog.
    pub popular: bool,
}

impl CreditPackage {
    /// Look up a package by its credit amount.
    #[must_use]
    pub fn find(credits: u32) -> Option<&'static Self> {
        CREDIT_PACKAGES.iter().find(|p| p.credits == credits)
    }

    /// The package price in USD.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::new(Decimal::new(self.price_cents, 2), CurrencyCode::USD)
    }
}

/// Packages offered at checkout.
pub const CREDIT_PACKAGES: [CreditPackage; 3] = [
    CreditPackage {
        credits: 10,
        name: "Starter Pack",
        description: "Perfect for trying things out.",
        price_cents: 200,
        popular: false,
    },
    CreditPackage {
        credits: 50,
        name: "Creator Pack",
        description: "Save 20% and style more.",
        price_cents: 800,
        popular: true,
    },
    CreditPackage {
        credits: 100,
        name: "Pro Pack",
        description: "Best value for power users.",
        price_cents: 1500,
        popular: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_package() {
        let pack = CreditPackage::find(50).expect("creator pack");
        assert_eq!(pack.name, "Creator Pack");
        assert_eq!(pack.price().amount, Decimal::new(8, 0));
        assert_eq!(pack.price().currency_code, CurrencyCode::USD);
    }

    #[test]
    fn test_find_unknown_package() {
        assert!(CreditPackage::find(7).is_none());
    }
}
