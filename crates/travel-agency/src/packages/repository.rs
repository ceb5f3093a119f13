use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::destination::Destination;
use super::domain::{
    ActivityId, DestinationId, EntityKind, EntityRef, PackageId, PassengerId,
};
use super::package::TravelPackage;
use super::passenger::Passenger;

/// One stored entity of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Activity(Activity),
    Destination(Destination),
    Passenger(Passenger),
    Package(TravelPackage),
}

impl Record {
    pub fn entity(&self) -> EntityRef {
        match self {
            Record::Activity(activity) => EntityRef::Activity(activity.id),
            Record::Destination(destination) => EntityRef::Destination(destination.id),
            Record::Passenger(passenger) => EntityRef::Passenger(passenger.id),
            Record::Package(package) => EntityRef::Package(package.id),
        }
    }
}

/// Everything one operation writes. Stores apply it all or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub saved: Vec<Record>,
    pub deleted: Vec<EntityRef>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.deleted.is_empty()
    }
}

/// Storage abstraction so the rule engine can be exercised without a database.
pub trait TravelRepository: Send + Sync {
    /// Reserve a fresh identifier for a new entity of `kind`.
    fn allocate_id(&self, kind: EntityKind) -> Result<u64, RepositoryError>;

    fn fetch_activity(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError>;
    fn fetch_destination(&self, id: DestinationId)
        -> Result<Option<Destination>, RepositoryError>;
    fn fetch_passenger(&self, id: PassengerId) -> Result<Option<Passenger>, RepositoryError>;
    fn fetch_package(&self, id: PackageId) -> Result<Option<TravelPackage>, RepositoryError>;

    fn activities(&self) -> Result<Vec<Activity>, RepositoryError>;
    fn destinations(&self) -> Result<Vec<Destination>, RepositoryError>;
    fn passengers(&self) -> Result<Vec<Passenger>, RepositoryError>;
    fn packages(&self) -> Result<Vec<TravelPackage>, RepositoryError>;

    /// Persist saved records and drop deleted ones atomically.
    fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
