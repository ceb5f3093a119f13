use super::common::*;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use crate::packages::activity::Activity;
use crate::packages::arena::Arena;
use crate::packages::destination::Destination;
use crate::packages::domain::{
    ActivityId, BookingError, DestinationId, EntityRef, PackageId, PassengerId,
};
use crate::packages::package::TravelPackage;
use crate::packages::passenger::Passenger;
use crate::packages::policy::{PackageCapacityPolicy, RefundPolicy};
use crate::packages::pricing::Tier;
use crate::packages::repository::Record;
use crate::packages::rules;

fn booked_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 20, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

/// Goa owning a beach party (2000, 10 seats), Rahul (standard, 50000) and Sonia (gold,
/// 10000) enrolled in a two-seat package.
fn arena() -> Arena {
    let mut arena = Arena::new();
    let mut beach_party =
        Activity::new(ActivityId(1), new_activity("Beach Party", 2000, 10)).expect("valid");
    beach_party.destination = Some(DestinationId(1));
    let mut goa = Destination::new(DestinationId(1), "Goa").expect("valid");
    goa.activities.push(ActivityId(1));
    let casino = Activity::new(ActivityId(2), new_activity("Casino Night", 1000, 1)).expect("valid");

    arena.load_activity(beach_party);
    arena.load_activity(casino);
    arena.load_destination(goa);
    arena.load_passenger(
        Passenger::new(PassengerId(1), new_passenger("Rahul", Tier::Standard, 50000))
            .expect("valid"),
    );
    arena.load_passenger(
        Passenger::new(PassengerId(2), new_passenger("Sonia", Tier::Gold, 10000))
            .expect("valid"),
    );
    arena.load_passenger(
        Passenger::new(PassengerId(3), new_passenger("Asha", Tier::Premium, 0)).expect("valid"),
    );
    arena.load_package(TravelPackage::new(PackageId(1), "Goa Getaway", 2).expect("valid"));
    arena
}

#[test]
fn sign_up_then_cancel_restores_balance_and_seats() {
    let mut arena = arena();

    let booking =
        rules::sign_up(&mut arena, PassengerId(1), ActivityId(1), booked_at()).expect("signed up");
    assert_eq!(booking.price_paid, money(2000));
    assert_eq!(arena.passenger(PassengerId(1)).expect("rahul").balance, money(48000));
    assert_eq!(arena.activity(ActivityId(1)).expect("party").remaining, 9);
    arena.verify(true).expect("seat accounting holds");

    rules::cancel(&mut arena, PassengerId(1), ActivityId(1), RefundPolicy::PricePaid)
        .expect("cancelled");
    assert_eq!(arena.passenger(PassengerId(1)).expect("rahul").balance, money(50000));
    assert_eq!(arena.activity(ActivityId(1)).expect("party").remaining, 10);
    arena.verify(true).expect("seat accounting holds");
}

#[test]
fn gold_pays_ninety_percent_and_premium_pays_nothing() {
    let mut arena = arena();

    rules::sign_up(&mut arena, PassengerId(2), ActivityId(2), booked_at()).expect("gold books");
    assert_eq!(arena.passenger(PassengerId(2)).expect("sonia").balance, money(9100));

    rules::sign_up(&mut arena, PassengerId(3), ActivityId(1), booked_at())
        .expect("premium books");
    let asha = arena.passenger(PassengerId(3)).expect("asha");
    assert_eq!(asha.balance, Decimal::ZERO);
    assert_eq!(asha.bookings[0].price_paid, Decimal::ZERO);
}

#[test]
fn full_activity_rejects_every_tier() {
    let mut arena = arena();
    rules::sign_up(&mut arena, PassengerId(1), ActivityId(2), booked_at()).expect("last seat");

    for passenger in [PassengerId(2), PassengerId(3)] {
        match rules::sign_up(&mut arena, passenger, ActivityId(2), booked_at()) {
            Err(BookingError::CapacityExceeded { activity }) => {
                assert_eq!(activity, ActivityId(2))
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }
    assert_eq!(arena.activity(ActivityId(2)).expect("casino").remaining, 0);
}

#[test]
fn failed_sign_up_leaves_arena_untouched() {
    let mut arena = arena();
    let poor = Passenger::new(PassengerId(4), new_passenger("Ravi", Tier::Standard, 100))
        .expect("valid");
    arena.load_passenger(poor);
    let before = arena.clone();

    match rules::sign_up(&mut arena, PassengerId(4), ActivityId(1), booked_at()) {
        Err(BookingError::InsufficientBalance {
            required,
            available,
            ..
        }) => {
            assert_eq!(required, money(2000));
            assert_eq!(available, money(100));
        }
        other => panic!("expected insufficient balance, got {other:?}"),
    }
    assert_eq!(arena.passenger(PassengerId(4)), before.passenger(PassengerId(4)));
    assert_eq!(arena.activity(ActivityId(1)), before.activity(ActivityId(1)));
    assert!(!arena.is_dirty());
}

#[test]
fn current_cost_refund_uses_todays_price() {
    let mut arena = arena();
    rules::sign_up(&mut arena, PassengerId(2), ActivityId(1), booked_at()).expect("signed up");
    assert_eq!(arena.passenger(PassengerId(2)).expect("sonia").balance, money(8200));

    arena
        .activities
        .get_mut(&ActivityId(1))
        .expect("party loaded")
        .cost = money(3000);
    rules::cancel(&mut arena, PassengerId(2), ActivityId(1), RefundPolicy::CurrentCost)
        .expect("cancelled");
    assert_eq!(arena.passenger(PassengerId(2)).expect("sonia").balance, money(10900));
}

#[test]
fn cancel_without_booking_is_rejected() {
    let mut arena = arena();
    match rules::cancel(&mut arena, PassengerId(1), ActivityId(1), RefundPolicy::PricePaid) {
        Err(BookingError::NotSignedUp {
            passenger,
            activity,
        }) => {
            assert_eq!(passenger, PassengerId(1));
            assert_eq!(activity, ActivityId(1));
        }
        other => panic!("expected not signed up, got {other:?}"),
    }
}

#[test]
fn attaching_moves_ownership_between_destinations() {
    let mut arena = arena();
    arena.load_destination(Destination::new(DestinationId(2), "Manali").expect("valid"));

    rules::attach_activity(&mut arena, DestinationId(2), ActivityId(1)).expect("moved");
    assert!(arena.destination(DestinationId(1)).expect("goa").activities.is_empty());
    assert_eq!(
        arena.activity(ActivityId(1)).expect("party").destination,
        Some(DestinationId(2))
    );
    arena.verify(false).expect("ownership consistent");

    rules::attach_activity(&mut arena, DestinationId(2), ActivityId(1)).expect("idempotent");
    assert_eq!(
        arena.destination(DestinationId(2)).expect("manali").activities,
        vec![ActivityId(1)]
    );
}

#[test]
fn detaching_last_activity_clears_back_reference() {
    let mut arena = arena();
    rules::detach_activity(&mut arena, DestinationId(1), ActivityId(1)).expect("detached");
    assert!(arena.destination(DestinationId(1)).expect("goa").activities.is_empty());
    assert_eq!(arena.activity(ActivityId(1)).expect("party").destination, None);

    match rules::detach_activity(&mut arena, DestinationId(1), ActivityId(1)) {
        Err(BookingError::NotAssociated { member, owner }) => {
            assert_eq!(member, EntityRef::Activity(ActivityId(1)));
            assert_eq!(owner, EntityRef::Destination(DestinationId(1)));
        }
        other => panic!("expected not associated, got {other:?}"),
    }
}

#[test]
fn enrolment_is_all_or_nothing() {
    let mut arena = arena();
    match rules::enroll(
        &mut arena,
        PackageId(1),
        &[PassengerId(1), PassengerId(2), PassengerId(3)],
        PackageCapacityPolicy::Enforced,
    ) {
        Err(BookingError::PackageFull { capacity, .. }) => assert_eq!(capacity, 2),
        other => panic!("expected package full, got {other:?}"),
    }
    assert!(arena.package(PackageId(1)).expect("package").passengers.is_empty());

    match rules::enroll(
        &mut arena,
        PackageId(1),
        &[PassengerId(1), PassengerId(99)],
        PackageCapacityPolicy::Enforced,
    ) {
        Err(BookingError::NotFound(EntityRef::Passenger(PassengerId(99)))) => {}
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(!arena.passenger(PassengerId(1)).expect("rahul").belongs_to(PackageId(1)));
}

#[test]
fn advisory_capacity_admits_overflow() {
    let mut arena = arena();
    rules::enroll(
        &mut arena,
        PackageId(1),
        &[PassengerId(1), PassengerId(2), PassengerId(3), PassengerId(1)],
        PackageCapacityPolicy::Advisory,
    )
    .expect("advisory admits everyone");

    let package = arena.package(PackageId(1)).expect("package");
    assert_eq!(package.passengers.len(), 3);
    assert_eq!(package.open_seats(), 0);
    arena.verify(false).expect("membership consistent");
}

#[test]
fn withdrawing_a_stranger_is_rejected() {
    let mut arena = arena();
    rules::enroll(
        &mut arena,
        PackageId(1),
        &[PassengerId(1)],
        PackageCapacityPolicy::Enforced,
    )
    .expect("enrolled");

    match rules::withdraw(&mut arena, PackageId(1), &[PassengerId(1), PassengerId(2)]) {
        Err(BookingError::NotAssociated { member, .. }) => {
            assert_eq!(member, EntityRef::Passenger(PassengerId(2)))
        }
        other => panic!("expected not associated, got {other:?}"),
    }
    assert!(arena.package(PackageId(1)).expect("package").includes_passenger(PassengerId(1)));

    rules::withdraw(&mut arena, PackageId(1), &[PassengerId(1)]).expect("withdrawn");
    assert!(!arena.passenger(PassengerId(1)).expect("rahul").belongs_to(PackageId(1)));
}

#[test]
fn package_scoped_sign_up_requires_membership() {
    let mut arena = arena();
    match rules::sign_up_within_package(
        &mut arena,
        PackageId(1),
        PassengerId(1),
        ActivityId(1),
        booked_at(),
    ) {
        Err(BookingError::NotAssociated { owner, .. }) => {
            assert_eq!(owner, EntityRef::Package(PackageId(1)))
        }
        other => panic!("expected not associated, got {other:?}"),
    }

    rules::enroll(
        &mut arena,
        PackageId(1),
        &[PassengerId(1)],
        PackageCapacityPolicy::Enforced,
    )
    .expect("enrolled");
    rules::sign_up_within_package(
        &mut arena,
        PackageId(1),
        PassengerId(1),
        ActivityId(1),
        booked_at(),
    )
    .expect("member signs up");
    assert!(arena.passenger(PassengerId(1)).expect("rahul").is_signed_up(ActivityId(1)));
}

#[test]
fn retiring_an_activity_refunds_its_holders() {
    let mut arena = arena();
    rules::sign_up(&mut arena, PassengerId(1), ActivityId(1), booked_at()).expect("rahul");
    rules::sign_up(&mut arena, PassengerId(2), ActivityId(1), booked_at()).expect("sonia");

    rules::retire_activity(&mut arena, ActivityId(1), RefundPolicy::PricePaid).expect("retired");
    assert!(arena.activity(ActivityId(1)).is_err());
    assert!(arena.destination(DestinationId(1)).expect("goa").activities.is_empty());
    assert_eq!(arena.passenger(PassengerId(1)).expect("rahul").balance, money(50000));
    assert_eq!(arena.passenger(PassengerId(2)).expect("sonia").balance, money(10000));

    let changes = arena.into_change_set();
    assert!(changes
        .deleted
        .contains(&EntityRef::Activity(ActivityId(1))));
}

#[test]
fn retiring_a_passenger_frees_seats_and_memberships() {
    let mut arena = arena();
    rules::enroll(
        &mut arena,
        PackageId(1),
        &[PassengerId(1)],
        PackageCapacityPolicy::Enforced,
    )
    .expect("enrolled");
    rules::sign_up(&mut arena, PassengerId(1), ActivityId(1), booked_at()).expect("signed up");

    rules::retire_passenger(&mut arena, PassengerId(1)).expect("retired");
    assert_eq!(arena.activity(ActivityId(1)).expect("party").remaining, 10);
    assert!(arena.package(PackageId(1)).expect("package").passengers.is_empty());
    arena.verify(true).expect("seat accounting holds");
}

#[test]
fn booking_leaves_destination_ownership_untouched() {
    let mut arena = arena();

    rules::sign_up(&mut arena, PassengerId(1), ActivityId(1), booked_at()).expect("signed up");
    rules::cancel(&mut arena, PassengerId(1), ActivityId(1), RefundPolicy::PricePaid)
        .expect("cancelled");
    assert_eq!(
        arena.destination(DestinationId(1)).expect("goa").activities,
        vec![ActivityId(1)]
    );
    assert_eq!(
        arena.activity(ActivityId(1)).expect("party").destination,
        Some(DestinationId(1))
    );
    arena.verify(true).expect("ownership holds");

    let saved: Vec<EntityRef> = arena
        .into_change_set()
        .saved
        .iter()
        .map(Record::entity)
        .collect();
    assert!(!saved.contains(&EntityRef::Destination(DestinationId(1))));
}
