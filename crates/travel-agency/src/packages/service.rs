use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::activity::Activity;
use super::arena::{Arena, InvariantViolation};
use super::destination::Destination;
use super::domain::{
    ActivityChanges, ActivityId, BookingError, DestinationChanges, DestinationId, EntityKind,
    EntityRef, NewActivity, NewDestination, NewPackage, NewPassenger, PackageChanges, PackageId,
    PassengerChanges, PassengerId,
};
use super::package::TravelPackage;
use super::passenger::Passenger;
use super::policy::{BookingPolicy, PackageCapacityPolicy};
use super::report::{
    ActivityLine, AvailabilityLine, AvailabilityView, DestinationItinerary, ItineraryView,
    ManifestEntry, ManifestView, StatementLine, StatementView,
};
use super::repository::{RepositoryError, TravelRepository};
use super::rules;

/// Service applying the booking rules against a store.
///
/// Mutations run one at a time behind a write gate: each loads what it needs into an
/// [`Arena`], applies a rule, verifies the result and commits a single change set. Reads go
/// straight to the store.
pub struct TravelPackageService<R> {
    repository: Arc<R>,
    policy: BookingPolicy,
    write_gate: Mutex<()>,
}

impl<R> TravelPackageService<R>
where
    R: TravelRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: BookingPolicy) -> Self {
        Self {
            repository,
            policy,
            write_gate: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> BookingPolicy {
        self.policy
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn write<T>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut Workspace<'_, R>) -> Result<T, PackageServiceError>,
    ) -> Result<T, PackageServiceError> {
        let _gate = self
            .write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut workspace = Workspace {
            repository: self.repository.as_ref(),
            arena: Arena::new(),
        };

        let outcome = match apply(&mut workspace) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(operation, error = %err, "operation rejected");
                return Err(err);
            }
        };

        if let Err(violation) = workspace.arena.verify(false) {
            error!(operation, %violation, "refusing to commit inconsistent state");
            return Err(PackageServiceError::Invariant(violation));
        }

        let changes = workspace.arena.into_change_set();
        let saved = changes.saved.len();
        let deleted = changes.deleted.len();
        if !changes.is_empty() {
            self.repository.commit(changes)?;
        }
        info!(operation, saved, deleted, "operation committed");
        Ok(outcome)
    }

    // Activities

    pub fn create_activity(&self, draft: NewActivity) -> Result<Activity, PackageServiceError> {
        self.write("create_activity", |ws| {
            let mut activity = Activity::new(ActivityId(0), draft)?;
            activity.id = ActivityId(ws.repository.allocate_id(EntityKind::Activity)?);
            ws.arena.stage_activity(activity.clone());
            Ok(activity)
        })
    }

    pub fn activity(&self, id: ActivityId) -> Result<Activity, PackageServiceError> {
        self.repository
            .fetch_activity(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))
    }

    pub fn activities(&self) -> Result<Vec<Activity>, PackageServiceError> {
        Ok(self.repository.activities()?)
    }

    pub fn update_activity(
        &self,
        id: ActivityId,
        changes: ActivityChanges,
    ) -> Result<Activity, PackageServiceError> {
        self.write("update_activity", |ws| {
            ws.load_activity(id)?;
            let activity = ws.arena.activities.get_mut(&id).ok_or_else(|| {
                PackageServiceError::not_found(id)
            })?;
            activity.apply(changes)?;
            let updated = activity.clone();
            ws.arena.touch(id);
            Ok(updated)
        })
    }

    pub fn delete_activity(&self, id: ActivityId) -> Result<(), PackageServiceError> {
        let policy = self.policy.refund;
        self.write("delete_activity", |ws| {
            ws.load_activity_with_owner(id)?;
            ws.load_holders(id)?;
            rules::retire_activity(&mut ws.arena, id, policy)?;
            Ok(())
        })
    }

    // Destinations

    pub fn create_destination(
        &self,
        draft: NewDestination,
    ) -> Result<Destination, PackageServiceError> {
        self.write("create_destination", |ws| {
            let mut destination = Destination::new(DestinationId(0), &draft.name)?;
            for activity_id in &draft.activity_ids {
                ws.load_activity_with_owner(*activity_id)?;
            }
            destination.id = DestinationId(ws.repository.allocate_id(EntityKind::Destination)?);
            let id = destination.id;
            ws.arena.stage_destination(destination);
            for activity_id in draft.activity_ids {
                rules::attach_activity(&mut ws.arena, id, activity_id)?;
            }
            Ok(ws.arena.destination(id)?.clone())
        })
    }

    pub fn destination(&self, id: DestinationId) -> Result<Destination, PackageServiceError> {
        self.repository
            .fetch_destination(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))
    }

    pub fn destinations(&self) -> Result<Vec<Destination>, PackageServiceError> {
        Ok(self.repository.destinations()?)
    }

    pub fn add_activity_to_destination(
        &self,
        destination_id: DestinationId,
        activity_id: ActivityId,
    ) -> Result<Destination, PackageServiceError> {
        self.write("add_activity_to_destination", |ws| {
            ws.load_destination(destination_id)?;
            ws.load_activity_with_owner(activity_id)?;
            rules::attach_activity(&mut ws.arena, destination_id, activity_id)?;
            Ok(ws.arena.destination(destination_id)?.clone())
        })
    }

    pub fn remove_activity_from_destination(
        &self,
        destination_id: DestinationId,
        activity_id: ActivityId,
    ) -> Result<Destination, PackageServiceError> {
        self.write("remove_activity_from_destination", |ws| {
            ws.load_destination(destination_id)?;
            ws.load_activity(activity_id)?;
            rules::detach_activity(&mut ws.arena, destination_id, activity_id)?;
            Ok(ws.arena.destination(destination_id)?.clone())
        })
    }

    pub fn update_destination(
        &self,
        id: DestinationId,
        changes: DestinationChanges,
    ) -> Result<Destination, PackageServiceError> {
        self.write("update_destination", |ws| {
            ws.load_destination(id)?;
            let destination = ws
                .arena
                .destinations
                .get_mut(&id)
                .ok_or_else(|| PackageServiceError::not_found(id))?;
            destination.apply(changes)?;
            let updated = destination.clone();
            ws.arena.touch(id);
            Ok(updated)
        })
    }

    pub fn delete_destination(&self, id: DestinationId) -> Result<(), PackageServiceError> {
        let policy = self.policy.refund;
        self.write("delete_destination", |ws| {
            ws.load_destination(id)?;
            let owned = ws.arena.destination(id)?.activities.clone();
            for activity_id in owned {
                ws.load_activity(activity_id)?;
                ws.load_holders(activity_id)?;
            }
            ws.load_packages_listing(id)?;
            rules::retire_destination(&mut ws.arena, id, policy)?;
            Ok(())
        })
    }

    // Passengers

    pub fn create_passenger(&self, draft: NewPassenger) -> Result<Passenger, PackageServiceError> {
        self.write("create_passenger", |ws| {
            let mut passenger = Passenger::new(PassengerId(0), draft)?;
            passenger.id = PassengerId(ws.repository.allocate_id(EntityKind::Passenger)?);
            ws.arena.stage_passenger(passenger.clone());
            Ok(passenger)
        })
    }

    pub fn passenger(&self, id: PassengerId) -> Result<Passenger, PackageServiceError> {
        self.repository
            .fetch_passenger(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))
    }

    pub fn passengers(&self) -> Result<Vec<Passenger>, PackageServiceError> {
        Ok(self.repository.passengers()?)
    }

    /// Sign a passenger up for an activity.
    pub fn sign_up(
        &self,
        passenger_id: PassengerId,
        activity_id: ActivityId,
    ) -> Result<Passenger, PackageServiceError> {
        self.write("sign_up", |ws| {
            ws.load_passenger(passenger_id)?;
            ws.load_activity_with_owner(activity_id)?;
            rules::sign_up(&mut ws.arena, passenger_id, activity_id, Utc::now())?;
            Ok(ws.arena.passenger(passenger_id)?.clone())
        })
    }

    /// Cancel a passenger's sign-up, refunding per the configured policy.
    pub fn cancel(
        &self,
        passenger_id: PassengerId,
        activity_id: ActivityId,
    ) -> Result<Passenger, PackageServiceError> {
        let policy = self.policy.refund;
        self.write("cancel", |ws| {
            ws.load_passenger(passenger_id)?;
            ws.load_activity_with_owner(activity_id)?;
            rules::cancel(&mut ws.arena, passenger_id, activity_id, policy)?;
            Ok(ws.arena.passenger(passenger_id)?.clone())
        })
    }

    pub fn update_passenger(
        &self,
        id: PassengerId,
        changes: PassengerChanges,
    ) -> Result<Passenger, PackageServiceError> {
        self.write("update_passenger", |ws| {
            ws.load_passenger(id)?;
            let passenger = ws
                .arena
                .passengers
                .get_mut(&id)
                .ok_or_else(|| PackageServiceError::not_found(id))?;
            passenger.apply(changes)?;
            let updated = passenger.clone();
            ws.arena.touch(id);
            Ok(updated)
        })
    }

    pub fn delete_passenger(&self, id: PassengerId) -> Result<(), PackageServiceError> {
        self.write("delete_passenger", |ws| {
            ws.load_passenger(id)?;
            let passenger = ws.arena.passenger(id)?.clone();
            for booking in &passenger.bookings {
                ws.load_activity(booking.activity)?;
            }
            for package_id in &passenger.packages {
                ws.load_package(*package_id)?;
            }
            rules::retire_passenger(&mut ws.arena, id)?;
            Ok(())
        })
    }

    // Travel packages

    pub fn create_package(&self, draft: NewPackage) -> Result<TravelPackage, PackageServiceError> {
        let capacity_policy = self.policy.package_capacity;
        self.write("create_package", |ws| {
            let mut package =
                TravelPackage::new(PackageId(0), &draft.name, draft.passenger_capacity)?;
            for destination_id in &draft.destination_ids {
                ws.load_destination(*destination_id)?;
            }
            for passenger_id in &draft.passenger_ids {
                ws.load_passenger(*passenger_id)?;
            }
            let enrolling: BTreeSet<_> = draft.passenger_ids.iter().collect();
            if capacity_policy == PackageCapacityPolicy::Enforced
                && enrolling.len() > package.passenger_capacity as usize
            {
                return Err(BookingError::invalid(format!(
                    "{} passengers do not fit a package for {}",
                    enrolling.len(),
                    package.passenger_capacity
                ))
                .into());
            }
            package.id = PackageId(ws.repository.allocate_id(EntityKind::Package)?);
            let id = package.id;
            ws.arena.stage_package(package);

            for destination_id in &draft.destination_ids {
                if !ws.arena.package(id)?.includes_destination(*destination_id) {
                    rules::include_destination(&mut ws.arena, id, *destination_id)?;
                }
            }
            rules::enroll(&mut ws.arena, id, &draft.passenger_ids, capacity_policy)?;
            Ok(ws.arena.package(id)?.clone())
        })
    }

    pub fn package(&self, id: PackageId) -> Result<TravelPackage, PackageServiceError> {
        self.repository
            .fetch_package(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))
    }

    pub fn packages(&self) -> Result<Vec<TravelPackage>, PackageServiceError> {
        Ok(self.repository.packages()?)
    }

    pub fn update_package(
        &self,
        id: PackageId,
        changes: PackageChanges,
    ) -> Result<TravelPackage, PackageServiceError> {
        let capacity_policy = self.policy.package_capacity;
        self.write("update_package", |ws| {
            ws.load_package(id)?;
            let package = ws
                .arena
                .packages
                .get_mut(&id)
                .ok_or_else(|| PackageServiceError::not_found(id))?;
            package.apply(changes, capacity_policy)?;
            let updated = package.clone();
            ws.arena.touch(id);
            Ok(updated)
        })
    }

    pub fn add_destination_to_package(
        &self,
        package_id: PackageId,
        destination_id: DestinationId,
    ) -> Result<TravelPackage, PackageServiceError> {
        self.write("add_destination_to_package", |ws| {
            ws.load_package(package_id)?;
            ws.load_destination(destination_id)?;
            rules::include_destination(&mut ws.arena, package_id, destination_id)?;
            Ok(ws.arena.package(package_id)?.clone())
        })
    }

    pub fn remove_destination_from_package(
        &self,
        package_id: PackageId,
        destination_id: DestinationId,
    ) -> Result<TravelPackage, PackageServiceError> {
        self.write("remove_destination_from_package", |ws| {
            ws.load_package(package_id)?;
            rules::exclude_destination(&mut ws.arena, package_id, destination_id)?;
            Ok(ws.arena.package(package_id)?.clone())
        })
    }

    pub fn add_passenger_to_package(
        &self,
        package_id: PackageId,
        passenger_id: PassengerId,
    ) -> Result<TravelPackage, PackageServiceError> {
        self.add_passengers_to_package(package_id, &[passenger_id])
    }

    /// Enrol several passengers at once; nothing changes unless all of them can join.
    pub fn add_passengers_to_package(
        &self,
        package_id: PackageId,
        passenger_ids: &[PassengerId],
    ) -> Result<TravelPackage, PackageServiceError> {
        let capacity_policy = self.policy.package_capacity;
        self.write("add_passengers_to_package", |ws| {
            ws.load_package(package_id)?;
            for passenger_id in passenger_ids {
                ws.load_passenger(*passenger_id)?;
            }
            rules::enroll(&mut ws.arena, package_id, passenger_ids, capacity_policy)?;
            Ok(ws.arena.package(package_id)?.clone())
        })
    }

    pub fn remove_passenger_from_package(
        &self,
        package_id: PackageId,
        passenger_id: PassengerId,
    ) -> Result<TravelPackage, PackageServiceError> {
        self.remove_passengers_from_package(package_id, &[passenger_id])
    }

    pub fn remove_passengers_from_package(
        &self,
        package_id: PackageId,
        passenger_ids: &[PassengerId],
    ) -> Result<TravelPackage, PackageServiceError> {
        self.write("remove_passengers_from_package", |ws| {
            ws.load_package(package_id)?;
            for passenger_id in passenger_ids {
                ws.load_passenger(*passenger_id)?;
            }
            rules::withdraw(&mut ws.arena, package_id, passenger_ids)?;
            Ok(ws.arena.package(package_id)?.clone())
        })
    }

    pub fn add_activity_to_passenger(
        &self,
        package_id: PackageId,
        passenger_id: PassengerId,
        activity_id: ActivityId,
    ) -> Result<Passenger, PackageServiceError> {
        self.write("add_activity_to_passenger", |ws| {
            ws.load_package(package_id)?;
            ws.load_passenger(passenger_id)?;
            ws.load_activity_with_owner(activity_id)?;
            rules::sign_up_within_package(
                &mut ws.arena,
                package_id,
                passenger_id,
                activity_id,
                Utc::now(),
            )?;
            Ok(ws.arena.passenger(passenger_id)?.clone())
        })
    }

    pub fn remove_activity_from_passenger(
        &self,
        package_id: PackageId,
        passenger_id: PassengerId,
        activity_id: ActivityId,
    ) -> Result<Passenger, PackageServiceError> {
        let policy = self.policy.refund;
        self.write("remove_activity_from_passenger", |ws| {
            ws.load_package(package_id)?;
            ws.load_passenger(passenger_id)?;
            ws.load_activity_with_owner(activity_id)?;
            rules::cancel_within_package(
                &mut ws.arena,
                package_id,
                passenger_id,
                activity_id,
                policy,
            )?;
            Ok(ws.arena.passenger(passenger_id)?.clone())
        })
    }

    pub fn package_passengers(
        &self,
        package_id: PackageId,
    ) -> Result<Vec<Passenger>, PackageServiceError> {
        let package = self.package(package_id)?;
        package
            .passengers
            .iter()
            .map(|id| self.passenger(*id))
            .collect()
    }

    pub fn package_destinations(
        &self,
        package_id: PackageId,
    ) -> Result<Vec<Destination>, PackageServiceError> {
        let package = self.package(package_id)?;
        package
            .destinations
            .iter()
            .map(|id| self.destination(*id))
            .collect()
    }

    pub fn delete_package(&self, id: PackageId) -> Result<(), PackageServiceError> {
        self.write("delete_package", |ws| {
            ws.load_package(id)?;
            let members = ws.arena.package(id)?.passengers.clone();
            for passenger_id in members {
                ws.load_passenger(passenger_id)?;
            }
            rules::retire_package(&mut ws.arena, id)?;
            Ok(())
        })
    }

    // Reports

    /// Destinations of a package with every activity they offer.
    pub fn itinerary(&self, package_id: PackageId) -> Result<ItineraryView, PackageServiceError> {
        let package = self.package(package_id)?;
        let destinations = self
            .package_destinations(package_id)?
            .into_iter()
            .map(|destination| {
                let activities = destination
                    .activities
                    .iter()
                    .map(|id| self.activity(*id).map(|activity| ActivityLine::from(&activity)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DestinationItinerary {
                    destination_id: destination.id,
                    name: destination.name,
                    activities,
                })
            })
            .collect::<Result<Vec<_>, PackageServiceError>>()?;

        Ok(ItineraryView {
            package_id,
            name: package.name,
            destinations,
        })
    }

    /// Enrolment list of a package.
    pub fn manifest(&self, package_id: PackageId) -> Result<ManifestView, PackageServiceError> {
        let package = self.package(package_id)?;
        let passengers: Vec<ManifestEntry> = self
            .package_passengers(package_id)?
            .iter()
            .map(ManifestEntry::from)
            .collect();

        Ok(ManifestView {
            package_id,
            name: package.name,
            passenger_capacity: package.passenger_capacity,
            enrolled: passengers.len(),
            passengers,
        })
    }

    /// A passenger's balance and the activities they hold.
    pub fn statement(
        &self,
        passenger_id: PassengerId,
    ) -> Result<StatementView, PackageServiceError> {
        let passenger = self.passenger(passenger_id)?;
        let mut activities = Vec::with_capacity(passenger.bookings.len());
        for booking in &passenger.bookings {
            let activity = self.activity(booking.activity)?;
            let destination = match activity.destination {
                Some(id) => Some(self.destination(id)?.name),
                None => None,
            };
            activities.push(StatementLine {
                activity_id: activity.id,
                activity: activity.name,
                destination,
                price_paid: booking.price_paid,
                booked_at: booking.booked_at,
            });
        }

        Ok(StatementView::new(&passenger, activities))
    }

    /// Activities across a package's destinations that still have seats.
    pub fn availability(
        &self,
        package_id: PackageId,
    ) -> Result<AvailabilityView, PackageServiceError> {
        let package = self.package(package_id)?;
        let mut activities = Vec::new();
        for destination in self.package_destinations(package_id)? {
            for activity_id in &destination.activities {
                let activity = self.activity(*activity_id)?;
                if activity.remaining > 0 {
                    activities.push(AvailabilityLine {
                        activity_id: activity.id,
                        activity: activity.name,
                        destination: destination.name.clone(),
                        cost: activity.cost,
                        remaining: activity.remaining,
                    });
                }
            }
        }

        Ok(AvailabilityView {
            package_id,
            name: package.name,
            activities,
        })
    }
}

/// Store handle plus the arena being built for one write.
struct Workspace<'r, R> {
    repository: &'r R,
    arena: Arena,
}

impl<R> Workspace<'_, R>
where
    R: TravelRepository,
{
    fn load_activity(&mut self, id: ActivityId) -> Result<(), PackageServiceError> {
        if self.arena.contains(id.into()) {
            return Ok(());
        }
        debug!(%id, "loading");
        let activity = self
            .repository
            .fetch_activity(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))?;
        self.arena.load_activity(activity);
        Ok(())
    }

    /// Load an activity together with the destination that owns it.
    fn load_activity_with_owner(&mut self, id: ActivityId) -> Result<(), PackageServiceError> {
        self.load_activity(id)?;
        if let Some(owner) = self.arena.activity(id)?.destination {
            self.load_destination(owner)?;
        }
        Ok(())
    }

    fn load_destination(&mut self, id: DestinationId) -> Result<(), PackageServiceError> {
        if self.arena.contains(id.into()) {
            return Ok(());
        }
        debug!(%id, "loading");
        let destination = self
            .repository
            .fetch_destination(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))?;
        self.arena.load_destination(destination);
        Ok(())
    }

    fn load_passenger(&mut self, id: PassengerId) -> Result<(), PackageServiceError> {
        if self.arena.contains(id.into()) {
            return Ok(());
        }
        debug!(%id, "loading");
        let passenger = self
            .repository
            .fetch_passenger(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))?;
        self.arena.load_passenger(passenger);
        Ok(())
    }

    fn load_package(&mut self, id: PackageId) -> Result<(), PackageServiceError> {
        if self.arena.contains(id.into()) {
            return Ok(());
        }
        debug!(%id, "loading");
        let package = self
            .repository
            .fetch_package(id)?
            .ok_or_else(|| PackageServiceError::not_found(id))?;
        self.arena.load_package(package);
        Ok(())
    }

    /// Load every passenger holding a seat on `activity`.
    fn load_holders(&mut self, activity: ActivityId) -> Result<(), PackageServiceError> {
        for passenger in self.repository.passengers()? {
            if passenger.is_signed_up(activity) {
                self.arena.load_passenger(passenger);
            }
        }
        Ok(())
    }

    /// Load every package listing `destination`.
    fn load_packages_listing(
        &mut self,
        destination: DestinationId,
    ) -> Result<(), PackageServiceError> {
        for package in self.repository.packages()? {
            if package.includes_destination(destination) {
                self.arena.load_package(package);
            }
        }
        Ok(())
    }
}

/// Error raised by the travel package service.
#[derive(Debug, thiserror::Error)]
pub enum PackageServiceError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("refusing to commit: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl PackageServiceError {
    pub fn not_found(entity: impl Into<EntityRef>) -> Self {
        Self::Booking(BookingError::NotFound(entity.into()))
    }

    /// The business-rule failure, if this is one.
    pub fn booking(&self) -> Option<&BookingError> {
        match self {
            PackageServiceError::Booking(err) => Some(err),
            _ => None,
        }
    }
}
