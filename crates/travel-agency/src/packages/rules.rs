//! Business rules over an [`Arena`].
//!
//! Every rule validates before it mutates, so an `Err` leaves the arena as it was. Callers load
//! each entity a rule names beforehand; anything missing surfaces as `NotFound`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::arena::{lookup, lookup_mut, Arena};
use super::domain::{ActivityId, BookingError, DestinationId, PackageId, PassengerId};
use super::passenger::Booking;
use super::policy::{PackageCapacityPolicy, RefundPolicy};

/// Take a seat on `activity` for `passenger`, charging the tier price.
pub fn sign_up(
    arena: &mut Arena,
    passenger_id: PassengerId,
    activity_id: ActivityId,
    booked_at: DateTime<Utc>,
) -> Result<Booking, BookingError> {
    let activity = lookup_mut(&mut arena.activities, activity_id)?;
    let passenger = lookup_mut(&mut arena.passengers, passenger_id)?;

    activity.ensure_open()?;
    let booking = passenger.sign_up(activity, booked_at)?;
    activity.select();

    arena.touch(passenger_id);
    arena.touch(activity_id);
    Ok(booking)
}

/// Give the seat back and credit the refund chosen by `policy`.
pub fn cancel(
    arena: &mut Arena,
    passenger_id: PassengerId,
    activity_id: ActivityId,
    policy: RefundPolicy,
) -> Result<Booking, BookingError> {
    let activity = lookup_mut(&mut arena.activities, activity_id)?;
    let passenger = lookup_mut(&mut arena.passengers, passenger_id)?;

    let booking = passenger.cancel(activity, policy)?;
    activity.unselect();

    arena.touch(passenger_id);
    arena.touch(activity_id);
    Ok(booking)
}

/// Sign up on behalf of a package member.
pub fn sign_up_within_package(
    arena: &mut Arena,
    package_id: PackageId,
    passenger_id: PassengerId,
    activity_id: ActivityId,
    booked_at: DateTime<Utc>,
) -> Result<Booking, BookingError> {
    ensure_member(arena, package_id, passenger_id)?;
    sign_up(arena, passenger_id, activity_id, booked_at)
}

pub fn cancel_within_package(
    arena: &mut Arena,
    package_id: PackageId,
    passenger_id: PassengerId,
    activity_id: ActivityId,
    policy: RefundPolicy,
) -> Result<Booking, BookingError> {
    ensure_member(arena, package_id, passenger_id)?;
    cancel(arena, passenger_id, activity_id, policy)
}

fn ensure_member(
    arena: &Arena,
    package_id: PackageId,
    passenger_id: PassengerId,
) -> Result<(), BookingError> {
    let package = lookup(&arena.packages, package_id)?;
    lookup(&arena.passengers, passenger_id)?;
    if !package.includes_passenger(passenger_id) {
        return Err(BookingError::NotAssociated {
            member: passenger_id.into(),
            owner: package_id.into(),
        });
    }
    Ok(())
}

/// Give `destination` ownership of `activity`, taking it from any previous owner.
pub fn attach_activity(
    arena: &mut Arena,
    destination_id: DestinationId,
    activity_id: ActivityId,
) -> Result<(), BookingError> {
    lookup(&arena.destinations, destination_id)?;
    let previous = lookup(&arena.activities, activity_id)?.destination;
    if let Some(previous) = previous.filter(|previous| *previous != destination_id) {
        lookup(&arena.destinations, previous)?;
    }

    if let Some(previous) = previous.filter(|previous| *previous != destination_id) {
        if let Some(destination) = arena.destinations.get_mut(&previous) {
            destination.remove(activity_id);
        }
        arena.touch(previous);
    }

    let destination = lookup_mut(&mut arena.destinations, destination_id)?;
    let inserted = destination.insert(activity_id);
    let activity = lookup_mut(&mut arena.activities, activity_id)?;
    let reassigned = activity.destination != Some(destination_id);
    activity.destination = Some(destination_id);

    if inserted {
        arena.touch(destination_id);
    }
    if reassigned {
        arena.touch(activity_id);
    }
    Ok(())
}

/// Remove `activity` from `destination` and clear its back-reference.
pub fn detach_activity(
    arena: &mut Arena,
    destination_id: DestinationId,
    activity_id: ActivityId,
) -> Result<(), BookingError> {
    let destination = lookup_mut(&mut arena.destinations, destination_id)?;
    let activity = lookup_mut(&mut arena.activities, activity_id)?;
    if !destination.offers(activity_id) {
        return Err(BookingError::NotAssociated {
            member: activity_id.into(),
            owner: destination_id.into(),
        });
    }

    destination.remove(activity_id);
    if activity.destination == Some(destination_id) {
        activity.destination = None;
    }
    arena.touch(destination_id);
    arena.touch(activity_id);
    Ok(())
}

pub fn include_destination(
    arena: &mut Arena,
    package_id: PackageId,
    destination_id: DestinationId,
) -> Result<(), BookingError> {
    lookup(&arena.destinations, destination_id)?;
    let package = lookup_mut(&mut arena.packages, package_id)?;
    if !package.insert_destination(destination_id) {
        return Err(BookingError::AlreadyAssociated {
            member: destination_id.into(),
            owner: package_id.into(),
        });
    }
    arena.touch(package_id);
    Ok(())
}

pub fn exclude_destination(
    arena: &mut Arena,
    package_id: PackageId,
    destination_id: DestinationId,
) -> Result<(), BookingError> {
    let package = lookup_mut(&mut arena.packages, package_id)?;
    if !package.remove_destination(destination_id) {
        return Err(BookingError::NotAssociated {
            member: destination_id.into(),
            owner: package_id.into(),
        });
    }
    arena.touch(package_id);
    Ok(())
}

/// Enrol passengers in a package, all or none.
///
/// Repeated ids in `passenger_ids` count once.
pub fn enroll(
    arena: &mut Arena,
    package_id: PackageId,
    passenger_ids: &[PassengerId],
    policy: PackageCapacityPolicy,
) -> Result<(), BookingError> {
    let batch = distinct(passenger_ids);
    let package = lookup(&arena.packages, package_id)?;
    for passenger_id in &batch {
        lookup(&arena.passengers, *passenger_id)?;
        if package.includes_passenger(*passenger_id) {
            return Err(BookingError::AlreadyAssociated {
                member: (*passenger_id).into(),
                owner: package_id.into(),
            });
        }
    }
    package.ensure_room(batch.len(), policy)?;

    for passenger_id in batch {
        if let Some(package) = arena.packages.get_mut(&package_id) {
            package.insert_passenger(passenger_id);
        }
        if let Some(passenger) = arena.passengers.get_mut(&passenger_id) {
            passenger.join(package_id);
        }
        arena.touch(passenger_id);
    }
    arena.touch(package_id);
    Ok(())
}

/// Withdraw passengers from a package, all or none. Their bookings are kept.
pub fn withdraw(
    arena: &mut Arena,
    package_id: PackageId,
    passenger_ids: &[PassengerId],
) -> Result<(), BookingError> {
    let batch = distinct(passenger_ids);
    let package = lookup(&arena.packages, package_id)?;
    for passenger_id in &batch {
        lookup(&arena.passengers, *passenger_id)?;
        if !package.includes_passenger(*passenger_id) {
            return Err(BookingError::NotAssociated {
                member: (*passenger_id).into(),
                owner: package_id.into(),
            });
        }
    }

    for passenger_id in batch {
        if let Some(package) = arena.packages.get_mut(&package_id) {
            package.remove_passenger(passenger_id);
        }
        if let Some(passenger) = arena.passengers.get_mut(&passenger_id) {
            passenger.leave(package_id);
        }
        arena.touch(passenger_id);
    }
    arena.touch(package_id);
    Ok(())
}

/// Delete an activity, cancelling every sign-up on it.
///
/// Every passenger holding a seat must already be in the arena.
pub fn retire_activity(
    arena: &mut Arena,
    activity_id: ActivityId,
    policy: RefundPolicy,
) -> Result<(), BookingError> {
    let activity = lookup(&arena.activities, activity_id)?.clone();
    if let Some(owner) = activity.destination {
        lookup(&arena.destinations, owner)?;
    }

    let holders: Vec<PassengerId> = arena
        .passengers
        .values()
        .filter(|passenger| passenger.is_signed_up(activity_id))
        .map(|passenger| passenger.id)
        .collect();
    for passenger_id in holders {
        if let Some(passenger) = arena.passengers.get_mut(&passenger_id) {
            passenger.cancel(&activity, policy)?;
        }
        arena.touch(passenger_id);
    }

    if let Some(owner) = activity.destination {
        if let Some(destination) = arena.destinations.get_mut(&owner) {
            destination.remove(activity_id);
        }
        arena.touch(owner);
    }
    arena.discard(activity_id);
    Ok(())
}

/// Delete a destination together with the activities it owns.
pub fn retire_destination(
    arena: &mut Arena,
    destination_id: DestinationId,
    policy: RefundPolicy,
) -> Result<(), BookingError> {
    let owned = lookup(&arena.destinations, destination_id)?.activities.clone();
    for activity_id in &owned {
        lookup(&arena.activities, *activity_id)?;
    }

    for activity_id in owned {
        retire_activity(arena, activity_id, policy)?;
    }

    let listing: Vec<PackageId> = arena
        .packages
        .values()
        .filter(|package| package.includes_destination(destination_id))
        .map(|package| package.id)
        .collect();
    for package_id in listing {
        if let Some(package) = arena.packages.get_mut(&package_id) {
            package.remove_destination(destination_id);
        }
        arena.touch(package_id);
    }

    arena.discard(destination_id);
    Ok(())
}

/// Delete a passenger, releasing held seats and package memberships.
pub fn retire_passenger(arena: &mut Arena, passenger_id: PassengerId) -> Result<(), BookingError> {
    let passenger = lookup(&arena.passengers, passenger_id)?;
    let held: Vec<ActivityId> = passenger
        .bookings
        .iter()
        .map(|booking| booking.activity)
        .collect();
    let joined = passenger.packages.clone();
    for activity_id in &held {
        lookup(&arena.activities, *activity_id)?;
    }
    for package_id in &joined {
        lookup(&arena.packages, *package_id)?;
    }

    for activity_id in held {
        if let Some(activity) = arena.activities.get_mut(&activity_id) {
            activity.unselect();
        }
        arena.touch(activity_id);
    }
    for package_id in joined {
        if let Some(package) = arena.packages.get_mut(&package_id) {
            package.remove_passenger(passenger_id);
        }
        arena.touch(package_id);
    }

    arena.discard(passenger_id);
    Ok(())
}

/// Delete a package; members stay, only their membership goes.
pub fn retire_package(arena: &mut Arena, package_id: PackageId) -> Result<(), BookingError> {
    let members = lookup(&arena.packages, package_id)?.passengers.clone();
    for passenger_id in members {
        if let Some(passenger) = arena.passengers.get_mut(&passenger_id) {
            passenger.leave(package_id);
            arena.touch(passenger_id);
        }
    }
    arena.discard(package_id);
    Ok(())
}

fn distinct<T: Ord + Copy>(ids: &[T]) -> Vec<T> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
