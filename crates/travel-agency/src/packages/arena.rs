//! Working set of entities for one operation.
//!
//! Relations are plain identifiers, so the "exactly one owner" and "both sides agree" rules are
//! checked by [`Arena::verify`] instead of living in pointer state. Whatever an operation
//! touches or removes becomes a [`ChangeSet`] for the store.

use std::collections::{BTreeMap, BTreeSet};

use super::activity::Activity;
use super::destination::Destination;
use super::domain::{
    ActivityId, BookingError, DestinationId, EntityRef, PackageId, PassengerId,
};
use super::package::TravelPackage;
use super::passenger::Passenger;
use super::repository::{ChangeSet, Record};

#[derive(Debug, Default, Clone)]
pub struct Arena {
    pub(crate) activities: BTreeMap<ActivityId, Activity>,
    pub(crate) destinations: BTreeMap<DestinationId, Destination>,
    pub(crate) passengers: BTreeMap<PassengerId, Passenger>,
    pub(crate) packages: BTreeMap<PackageId, TravelPackage>,
    touched: BTreeSet<EntityRef>,
    removed: BTreeSet<EntityRef>,
}

/// A broken cross-entity rule found by [`Arena::verify`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("{activity} has {remaining} seats left of {capacity}")]
    SeatsOutOfRange {
        activity: ActivityId,
        remaining: u32,
        capacity: u32,
    },
    #[error("{activity} has {booked} seats taken but {signed_up} passengers signed up")]
    SeatCount {
        activity: ActivityId,
        booked: u32,
        signed_up: u32,
    },
    #[error("{activity} and {destination} disagree about ownership")]
    Ownership {
        activity: ActivityId,
        destination: DestinationId,
    },
    #[error("{activity} is listed by more than one destination")]
    SharedActivity { activity: ActivityId },
    #[error("{passenger} and {package} disagree about membership")]
    Membership {
        passenger: PassengerId,
        package: PackageId,
    },
    #[error("{owner} lists {member} more than once")]
    Duplicate { owner: EntityRef, member: EntityRef },
}

pub(crate) fn lookup<K, V>(map: &BTreeMap<K, V>, id: K) -> Result<&V, BookingError>
where
    K: Ord + Copy + Into<EntityRef>,
{
    map.get(&id).ok_or_else(|| BookingError::NotFound(id.into()))
}

pub(crate) fn lookup_mut<K, V>(map: &mut BTreeMap<K, V>, id: K) -> Result<&mut V, BookingError>
where
    K: Ord + Copy + Into<EntityRef>,
{
    map.get_mut(&id)
        .ok_or_else(|| BookingError::NotFound(id.into()))
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a stored activity in the working set unless a copy is already staged.
    pub fn load_activity(&mut self, activity: Activity) {
        self.activities.entry(activity.id).or_insert(activity);
    }

    pub fn load_destination(&mut self, destination: Destination) {
        self.destinations
            .entry(destination.id)
            .or_insert(destination);
    }

    pub fn load_passenger(&mut self, passenger: Passenger) {
        self.passengers.entry(passenger.id).or_insert(passenger);
    }

    pub fn load_package(&mut self, package: TravelPackage) {
        self.packages.entry(package.id).or_insert(package);
    }

    pub fn activity(&self, id: ActivityId) -> Result<&Activity, BookingError> {
        lookup(&self.activities, id)
    }

    pub fn destination(&self, id: DestinationId) -> Result<&Destination, BookingError> {
        lookup(&self.destinations, id)
    }

    pub fn passenger(&self, id: PassengerId) -> Result<&Passenger, BookingError> {
        lookup(&self.passengers, id)
    }

    pub fn package(&self, id: PackageId) -> Result<&TravelPackage, BookingError> {
        lookup(&self.packages, id)
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Activity(id) => self.activities.contains_key(&id),
            EntityRef::Destination(id) => self.destinations.contains_key(&id),
            EntityRef::Passenger(id) => self.passengers.contains_key(&id),
            EntityRef::Package(id) => self.packages.contains_key(&id),
        }
    }

    /// Mark an entity as changed so it is saved on commit.
    pub(crate) fn touch(&mut self, entity: impl Into<EntityRef>) {
        let entity = entity.into();
        if !self.removed.contains(&entity) {
            self.touched.insert(entity);
        }
    }

    pub(crate) fn stage_activity(&mut self, activity: Activity) {
        let id = activity.id;
        self.activities.insert(id, activity);
        self.touch(id);
    }

    pub(crate) fn stage_destination(&mut self, destination: Destination) {
        let id = destination.id;
        self.destinations.insert(id, destination);
        self.touch(id);
    }

    pub(crate) fn stage_passenger(&mut self, passenger: Passenger) {
        let id = passenger.id;
        self.passengers.insert(id, passenger);
        self.touch(id);
    }

    pub(crate) fn stage_package(&mut self, package: TravelPackage) {
        let id = package.id;
        self.packages.insert(id, package);
        self.touch(id);
    }

    /// Drop an entity from the working set and schedule its deletion.
    pub(crate) fn discard(&mut self, entity: impl Into<EntityRef>) {
        let entity = entity.into();
        match entity {
            EntityRef::Activity(id) => {
                self.activities.remove(&id);
            }
            EntityRef::Destination(id) => {
                self.destinations.remove(&id);
            }
            EntityRef::Passenger(id) => {
                self.passengers.remove(&id);
            }
            EntityRef::Package(id) => {
                self.packages.remove(&id);
            }
        }
        self.touched.remove(&entity);
        self.removed.insert(entity);
    }

    pub fn is_dirty(&self) -> bool {
        !self.touched.is_empty() || !self.removed.is_empty()
    }

    pub fn into_change_set(mut self) -> ChangeSet {
        let saved = self
            .touched
            .iter()
            .filter_map(|entity| match entity {
                EntityRef::Activity(id) => self.activities.remove(id).map(Record::Activity),
                EntityRef::Destination(id) => {
                    self.destinations.remove(id).map(Record::Destination)
                }
                EntityRef::Passenger(id) => self.passengers.remove(id).map(Record::Passenger),
                EntityRef::Package(id) => self.packages.remove(id).map(Record::Package),
            })
            .collect();

        ChangeSet {
            saved,
            deleted: self.removed.into_iter().collect(),
        }
    }

    /// Check relationship rules among the loaded entities.
    ///
    /// Relations that point outside the working set are not judged. Seat accounting is only
    /// checked with `complete` set, since it needs every passenger in view.
    pub fn verify(&self, complete: bool) -> Result<(), InvariantViolation> {
        let mut listed: BTreeSet<ActivityId> = BTreeSet::new();
        for destination in self.destinations.values() {
            let mut seen = BTreeSet::new();
            for activity_id in &destination.activities {
                if !seen.insert(*activity_id) {
                    return Err(InvariantViolation::Duplicate {
                        owner: destination.id.into(),
                        member: (*activity_id).into(),
                    });
                }
                if !listed.insert(*activity_id) {
                    return Err(InvariantViolation::SharedActivity {
                        activity: *activity_id,
                    });
                }
                if let Some(activity) = self.activities.get(activity_id) {
                    if activity.destination != Some(destination.id) {
                        return Err(InvariantViolation::Ownership {
                            activity: activity.id,
                            destination: destination.id,
                        });
                    }
                }
            }
        }

        for activity in self.activities.values() {
            if activity.remaining > activity.capacity {
                return Err(InvariantViolation::SeatsOutOfRange {
                    activity: activity.id,
                    remaining: activity.remaining,
                    capacity: activity.capacity,
                });
            }
            if let Some(owner) = activity.destination {
                if let Some(destination) = self.destinations.get(&owner) {
                    if !destination.offers(activity.id) {
                        return Err(InvariantViolation::Ownership {
                            activity: activity.id,
                            destination: owner,
                        });
                    }
                }
            }
            if complete {
                let signed_up = self
                    .passengers
                    .values()
                    .filter(|passenger| passenger.is_signed_up(activity.id))
                    .count();
                let signed_up = u32::try_from(signed_up).unwrap_or(u32::MAX);
                if signed_up != activity.booked() {
                    return Err(InvariantViolation::SeatCount {
                        activity: activity.id,
                        booked: activity.booked(),
                        signed_up,
                    });
                }
            }
        }

        for package in self.packages.values() {
            check_unique(package.id.into(), &package.destinations)?;
            check_unique(package.id.into(), &package.passengers)?;
            for passenger_id in &package.passengers {
                if let Some(passenger) = self.passengers.get(passenger_id) {
                    if !passenger.belongs_to(package.id) {
                        return Err(InvariantViolation::Membership {
                            passenger: passenger.id,
                            package: package.id,
                        });
                    }
                }
            }
        }

        for passenger in self.passengers.values() {
            check_unique(passenger.id.into(), &passenger.packages)?;
            for package_id in &passenger.packages {
                if let Some(package) = self.packages.get(package_id) {
                    if !package.includes_passenger(passenger.id) {
                        return Err(InvariantViolation::Membership {
                            passenger: passenger.id,
                            package: package.id,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn check_unique<T>(owner: EntityRef, members: &[T]) -> Result<(), InvariantViolation>
where
    T: Ord + Copy + Into<EntityRef>,
{
    let mut seen = BTreeSet::new();
    for member in members {
        if !seen.insert(*member) {
            return Err(InvariantViolation::Duplicate {
                owner,
                member: (*member).into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::domain::NewActivity;
    use rust_decimal::Decimal;

    fn activity(id: u64) -> Activity {
        Activity::new(
            ActivityId(id),
            NewActivity {
                name: format!("Activity {id}"),
                description: String::new(),
                cost: Decimal::new(100, 0),
                capacity: 2,
            },
        )
        .expect("valid activity")
    }

    #[test]
    fn change_set_contains_touched_and_removed_only() {
        let mut arena = Arena::new();
        arena.load_activity(activity(1));
        arena.load_activity(activity(2));
        arena.stage_destination(Destination::new(DestinationId(1), "Goa").expect("valid"));
        arena.touch(ActivityId(1));
        arena.discard(ActivityId(2));
        arena.touch(ActivityId(2));

        let changes = arena.into_change_set();
        let saved: Vec<EntityRef> = changes.saved.iter().map(Record::entity).collect();
        assert_eq!(
            saved,
            vec![
                EntityRef::Activity(ActivityId(1)),
                EntityRef::Destination(DestinationId(1)),
            ]
        );
        assert_eq!(changes.deleted, vec![EntityRef::Activity(ActivityId(2))]);
    }

    #[test]
    fn loading_does_not_overwrite_staged_copies() {
        let mut arena = Arena::new();
        let mut staged = activity(1);
        staged.remaining = 1;
        arena.stage_activity(staged);
        arena.load_activity(activity(1));
        assert_eq!(arena.activity(ActivityId(1)).expect("present").remaining, 1);
    }

    #[test]
    fn verify_flags_one_sided_ownership() {
        let mut arena = Arena::new();
        let mut goa = Destination::new(DestinationId(1), "Goa").expect("valid");
        goa.activities.push(ActivityId(1));
        arena.load_destination(goa);
        arena.load_activity(activity(1));

        assert_eq!(
            arena.verify(false),
            Err(InvariantViolation::Ownership {
                activity: ActivityId(1),
                destination: DestinationId(1),
            })
        );
    }

    #[test]
    fn verify_flags_activity_listed_twice() {
        let mut arena = Arena::new();
        for id in 1..=2 {
            let mut destination =
                Destination::new(DestinationId(id), &format!("Place {id}")).expect("valid");
            destination.activities.push(ActivityId(9));
            arena.load_destination(destination);
        }
        assert_eq!(
            arena.verify(false),
            Err(InvariantViolation::SharedActivity {
                activity: ActivityId(9)
            })
        );
    }

    #[test]
    fn complete_verify_counts_seats() {
        let mut arena = Arena::new();
        let mut scuba = activity(1);
        scuba.select();
        arena.load_activity(scuba);

        assert!(arena.verify(false).is_ok());
        assert!(matches!(
            arena.verify(true),
            Err(InvariantViolation::SeatCount {
                booked: 1,
                signed_up: 0,
                ..
            })
        ));
    }
}
