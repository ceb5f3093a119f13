//! Travel packages: activities grouped under destinations, passengers who book them, and the
//! packages that bundle destinations and passengers together.
//!
//! Entities refer to each other by id. Every mutation goes through [`TravelPackageService`],
//! which applies the booking rules to an [`Arena`] and commits the result as one change set.

pub mod activity;
pub mod arena;
pub mod catalog;
pub mod destination;
pub mod domain;
pub mod memory;
pub mod package;
pub mod passenger;
pub mod policy;
pub mod pricing;
pub mod report;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use activity::{Activity, CapacityState};
pub use arena::{Arena, InvariantViolation};
pub use catalog::{CatalogImportError, CatalogImporter, CatalogSummary};
pub use destination::Destination;
pub use domain::{
    ActivityChanges, ActivityId, BookingError, DestinationChanges, DestinationId, EntityKind,
    EntityRef, Money, NewActivity, NewDestination, NewPackage, NewPassenger, PackageChanges,
    PackageId, PassengerChanges, PassengerId,
};
pub use memory::InMemoryTravelRepository;
pub use package::TravelPackage;
pub use passenger::{Booking, Passenger};
pub use policy::{BookingPolicy, PackageCapacityPolicy, RefundPolicy};
pub use pricing::{Quote, Shortfall, Tier};
pub use report::{
    ActivityLine, AvailabilityLine, AvailabilityView, DestinationItinerary, ItineraryView,
    ManifestEntry, ManifestView, StatementLine, StatementView,
};
pub use repository::{ChangeSet, Record, RepositoryError, TravelRepository};
pub use router::{packages_router, PassengerBatch};
pub use service::{PackageServiceError, TravelPackageService};
