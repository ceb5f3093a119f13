use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::domain::{
    require_name, require_non_negative, ActivityId, BookingError, EntityRef, Money, NewPassenger,
    PackageId, PassengerChanges, PassengerId,
};
use super::policy::RefundPolicy;
use super::pricing::Tier;

/// A seat a passenger holds on an activity and what was charged for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub activity: ActivityId,
    pub price_paid: Money,
    pub booked_at: DateTime<Utc>,
}

/// Traveller with a fixed tier, a balance and the activities they signed up for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub name: String,
    pub number: String,
    pub tier: Tier,
    pub balance: Money,
    pub bookings: Vec<Booking>,
    pub packages: Vec<PackageId>,
}

impl Passenger {
    pub fn new(id: PassengerId, draft: NewPassenger) -> Result<Self, BookingError> {
        let name = require_name("passenger name", &draft.name)?;
        let number = require_name("passenger number", &draft.number)?;
        let balance = validate_balance(draft.tier, draft.balance)?;

        Ok(Self {
            id,
            name,
            number,
            tier: draft.tier,
            balance,
            bookings: Vec::new(),
            packages: Vec::new(),
        })
    }

    pub fn booking(&self, activity: ActivityId) -> Option<&Booking> {
        self.bookings
            .iter()
            .find(|booking| booking.activity == activity)
    }

    pub fn is_signed_up(&self, activity: ActivityId) -> bool {
        self.booking(activity).is_some()
    }

    pub fn belongs_to(&self, package: PackageId) -> bool {
        self.packages.contains(&package)
    }

    /// Total charged for the seats currently held.
    pub fn committed_spend(&self) -> Money {
        self.bookings.iter().map(|booking| booking.price_paid).sum()
    }

    /// Charge the tier price and record the booking. Capacity is the caller's concern.
    pub(crate) fn sign_up(
        &mut self,
        activity: &Activity,
        booked_at: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        if self.is_signed_up(activity.id) {
            return Err(BookingError::AlreadyAssociated {
                member: EntityRef::Passenger(self.id),
                owner: EntityRef::Activity(activity.id),
            });
        }

        let quote = self.tier.quote(self.balance, activity.cost).map_err(|shortfall| {
            BookingError::InsufficientBalance {
                passenger: self.id,
                required: shortfall.required,
                available: shortfall.available,
            }
        })?;

        let booking = Booking {
            activity: activity.id,
            price_paid: quote.price,
            booked_at,
        };
        self.balance = quote.balance_after;
        self.bookings.push(booking.clone());
        Ok(booking)
    }

    /// Drop the booking and credit the refund the policy dictates.
    pub(crate) fn cancel(
        &mut self,
        activity: &Activity,
        policy: RefundPolicy,
    ) -> Result<Booking, BookingError> {
        let position = self
            .bookings
            .iter()
            .position(|booking| booking.activity == activity.id)
            .ok_or(BookingError::NotSignedUp {
                passenger: self.id,
                activity: activity.id,
            })?;

        let booking = self.bookings.remove(position);
        let refund = match policy {
            RefundPolicy::PricePaid => booking.price_paid,
            RefundPolicy::CurrentCost => self.tier.price(activity.cost),
        };
        self.balance = self.tier.refund(self.balance, refund);
        Ok(booking)
    }

    pub(crate) fn join(&mut self, package: PackageId) -> bool {
        if self.belongs_to(package) {
            return false;
        }
        self.packages.push(package);
        true
    }

    pub(crate) fn leave(&mut self, package: PackageId) -> bool {
        let before = self.packages.len();
        self.packages.retain(|joined| *joined != package);
        before != self.packages.len()
    }

    pub(crate) fn apply(&mut self, changes: PassengerChanges) -> Result<(), BookingError> {
        let name = changes
            .name
            .map(|name| require_name("passenger name", &name))
            .transpose()?;
        let number = changes
            .number
            .map(|number| require_name("passenger number", &number))
            .transpose()?;
        let balance = changes
            .balance
            .map(|balance| validate_balance(self.tier, balance))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(number) = number {
            self.number = number;
        }
        if let Some(balance) = balance {
            self.balance = balance;
        }
        Ok(())
    }
}

fn validate_balance(tier: Tier, balance: Money) -> Result<Money, BookingError> {
    let balance = require_non_negative("passenger balance", balance)?;
    if !tier.tracks_balance() && !balance.is_zero() {
        return Err(BookingError::invalid(
            "premium passengers carry no balance; use 0",
        ));
    }
    Ok(if tier.tracks_balance() {
        balance
    } else {
        Decimal::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::domain::NewActivity;

    fn money(value: i64) -> Money {
        Decimal::new(value, 0)
    }

    fn passenger(tier: Tier, balance: i64) -> Passenger {
        Passenger::new(
            PassengerId(1),
            NewPassenger {
                name: "Rahul".to_string(),
                number: "P-001".to_string(),
                tier,
                balance: money(balance),
            },
        )
        .expect("valid passenger")
    }

    fn activity(cost: i64) -> Activity {
        Activity::new(
            ActivityId(7),
            NewActivity {
                name: "Scuba".to_string(),
                description: String::new(),
                cost: money(cost),
                capacity: 4,
            },
        )
        .expect("valid activity")
    }

    #[test]
    fn failed_sign_up_leaves_passenger_untouched() {
        let mut rahul = passenger(Tier::Standard, 100);
        let error = rahul
            .sign_up(&activity(150), Utc::now())
            .expect_err("cannot afford");
        assert!(matches!(error, BookingError::InsufficientBalance { .. }));
        assert_eq!(rahul.balance, money(100));
        assert!(rahul.bookings.is_empty());
    }

    #[test]
    fn double_sign_up_is_rejected() {
        let mut rahul = passenger(Tier::Standard, 1000);
        let scuba = activity(100);
        rahul.sign_up(&scuba, Utc::now()).expect("first sign-up");
        assert!(matches!(
            rahul.sign_up(&scuba, Utc::now()),
            Err(BookingError::AlreadyAssociated { .. })
        ));
        assert_eq!(rahul.balance, money(900));
    }

    #[test]
    fn refund_policy_selects_amount() {
        let mut sonia = passenger(Tier::Gold, 10000);
        let mut scuba = activity(1000);
        sonia.sign_up(&scuba, Utc::now()).expect("affordable");
        assert_eq!(sonia.balance, money(9100));

        scuba.cost = money(2000);
        let mut current = sonia.clone();
        current
            .cancel(&scuba, RefundPolicy::CurrentCost)
            .expect("signed up");
        assert_eq!(current.balance, money(10900));

        sonia
            .cancel(&scuba, RefundPolicy::PricePaid)
            .expect("signed up");
        assert_eq!(sonia.balance, money(10000));
    }

    #[test]
    fn cancel_without_booking_reports_not_signed_up() {
        let mut rahul = passenger(Tier::Standard, 10);
        assert!(matches!(
            rahul.cancel(&activity(5), RefundPolicy::PricePaid),
            Err(BookingError::NotSignedUp { .. })
        ));
    }

    #[test]
    fn premium_balance_is_fixed_at_zero() {
        let draft = NewPassenger {
            name: "Asha".to_string(),
            number: "P-003".to_string(),
            tier: Tier::Premium,
            balance: money(50),
        };
        assert!(Passenger::new(PassengerId(3), draft).is_err());

        let mut asha = passenger(Tier::Premium, 0);
        assert!(asha
            .apply(PassengerChanges {
                balance: Some(money(10)),
                ..PassengerChanges::default()
            })
            .is_err());
        asha.sign_up(&activity(5000), Utc::now())
            .expect("premium always affordable");
        assert_eq!(asha.balance, Decimal::ZERO);
        assert_eq!(asha.committed_spend(), Decimal::ZERO);
    }
}
