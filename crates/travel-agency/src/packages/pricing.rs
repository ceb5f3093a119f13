//! Tier pricing.
//!
//! Each tier is a variant of one capability set: quote a sign-up against a balance and credit a
//! refund back. Dispatch is a plain `match` on the tier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::Money;

/// Fixed pricing class of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Standard,
    Gold,
    Premium,
}

/// Fraction of the list cost a gold passenger pays.
fn gold_rate() -> Decimal {
    Decimal::new(9, 1)
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Gold => "gold",
            Tier::Premium => "premium",
        }
    }

    /// Price this tier pays for an activity with the given list cost.
    pub fn price(self, cost: Money) -> Money {
        match self {
            Tier::Standard => cost,
            Tier::Gold => cost * gold_rate(),
            Tier::Premium => Decimal::ZERO,
        }
    }

    /// Whether the passenger's balance takes part in bookings at all.
    pub const fn tracks_balance(self) -> bool {
        !matches!(self, Tier::Premium)
    }

    /// Check affordability and compute the balance after a sign-up.
    pub fn quote(self, balance: Money, cost: Money) -> Result<Quote, Shortfall> {
        let price = self.price(cost);
        if !self.tracks_balance() {
            return Ok(Quote {
                price,
                balance_after: balance,
            });
        }

        if balance < price {
            return Err(Shortfall {
                required: price,
                available: balance,
            });
        }

        Ok(Quote {
            price,
            balance_after: balance - price,
        })
    }

    /// Balance after crediting `amount` back on cancellation.
    pub fn refund(self, balance: Money, amount: Money) -> Money {
        if self.tracks_balance() {
            balance + amount
        } else {
            balance
        }
    }
}

/// Outcome of an affordable sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Money,
    pub balance_after: Money,
}

/// Why a sign-up could not be afforded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub required: Money,
    pub available: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(value: i64) -> Money {
        Decimal::new(value, 0)
    }

    #[test]
    fn gold_pays_ninety_percent_of_standard() {
        for cost in [money(0), money(1), money(150), Decimal::new(1999, 2)] {
            assert_eq!(
                Tier::Gold.price(cost),
                Tier::Standard.price(cost) * Decimal::new(9, 1)
            );
            assert_eq!(Tier::Premium.price(cost), Decimal::ZERO);
        }
        assert_eq!(Tier::Gold.price(money(1000)), money(900));
    }

    #[test]
    fn standard_quote_requires_full_cost() {
        let shortfall = Tier::Standard
            .quote(money(100), money(150))
            .expect_err("150 exceeds balance");
        assert_eq!(shortfall.required, money(150));
        assert_eq!(shortfall.available, money(100));

        let quote = Tier::Standard
            .quote(money(100), money(100))
            .expect("exact balance is enough");
        assert_eq!(quote.balance_after, Decimal::ZERO);
    }

    #[test]
    fn gold_quote_uses_discounted_price() {
        let quote = Tier::Gold
            .quote(money(10000), money(1000))
            .expect("affordable");
        assert_eq!(quote.price, money(900));
        assert_eq!(quote.balance_after, money(9100));

        assert!(Tier::Gold.quote(money(899), money(1000)).is_err());
        assert!(Tier::Gold.quote(money(900), money(1000)).is_ok());
    }

    #[test]
    fn premium_never_touches_balance() {
        let quote = Tier::Premium
            .quote(Decimal::ZERO, money(5000))
            .expect("premium always affordable");
        assert_eq!(quote.price, Decimal::ZERO);
        assert_eq!(quote.balance_after, Decimal::ZERO);
        assert_eq!(Tier::Premium.refund(Decimal::ZERO, money(5000)), Decimal::ZERO);
    }

    #[test]
    fn refund_credits_tracked_balances() {
        assert_eq!(Tier::Standard.refund(money(48000), money(2000)), money(50000));
        assert_eq!(Tier::Gold.refund(money(9100), money(900)), money(10000));
    }
}
