use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::activity::Activity;
use super::destination::Destination;
use super::domain::{
    ActivityId, DestinationId, EntityKind, EntityRef, PackageId, PassengerId,
};
use super::package::TravelPackage;
use super::passenger::Passenger;
use super::repository::{ChangeSet, Record, RepositoryError, TravelRepository};

#[derive(Debug, Default)]
struct Tables {
    activities: BTreeMap<ActivityId, Activity>,
    destinations: BTreeMap<DestinationId, Destination>,
    passengers: BTreeMap<PassengerId, Passenger>,
    packages: BTreeMap<PackageId, TravelPackage>,
    sequences: BTreeMap<EntityKind, u64>,
}

/// Process-local store. Clones share the same tables.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTravelRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryTravelRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl TravelRepository for InMemoryTravelRepository {
    fn allocate_id(&self, kind: EntityKind) -> Result<u64, RepositoryError> {
        let mut tables = self.lock()?;
        let next = tables.sequences.entry(kind).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    fn fetch_activity(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError> {
        Ok(self.lock()?.activities.get(&id).cloned())
    }

    fn fetch_destination(
        &self,
        id: DestinationId,
    ) -> Result<Option<Destination>, RepositoryError> {
        Ok(self.lock()?.destinations.get(&id).cloned())
    }

    fn fetch_passenger(&self, id: PassengerId) -> Result<Option<Passenger>, RepositoryError> {
        Ok(self.lock()?.passengers.get(&id).cloned())
    }

    fn fetch_package(&self, id: PackageId) -> Result<Option<TravelPackage>, RepositoryError> {
        Ok(self.lock()?.packages.get(&id).cloned())
    }

    fn activities(&self) -> Result<Vec<Activity>, RepositoryError> {
        Ok(self.lock()?.activities.values().cloned().collect())
    }

    fn destinations(&self) -> Result<Vec<Destination>, RepositoryError> {
        Ok(self.lock()?.destinations.values().cloned().collect())
    }

    fn passengers(&self) -> Result<Vec<Passenger>, RepositoryError> {
        Ok(self.lock()?.passengers.values().cloned().collect())
    }

    fn packages(&self) -> Result<Vec<TravelPackage>, RepositoryError> {
        Ok(self.lock()?.packages.values().cloned().collect())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        for record in changes.saved {
            match record {
                Record::Activity(activity) => {
                    tables.activities.insert(activity.id, activity);
                }
                Record::Destination(destination) => {
                    tables.destinations.insert(destination.id, destination);
                }
                Record::Passenger(passenger) => {
                    tables.passengers.insert(passenger.id, passenger);
                }
                Record::Package(package) => {
                    tables.packages.insert(package.id, package);
                }
            }
        }
        for entity in changes.deleted {
            match entity {
                EntityRef::Activity(id) => {
                    tables.activities.remove(&id);
                }
                EntityRef::Destination(id) => {
                    tables.destinations.remove(&id);
                }
                EntityRef::Passenger(id) => {
                    tables.passengers.remove(&id);
                }
                EntityRef::Package(id) => {
                    tables.packages.remove(&id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequences_per_kind() {
        let repository = InMemoryTravelRepository::default();
        assert_eq!(repository.allocate_id(EntityKind::Activity), Ok(1));
        assert_eq!(repository.allocate_id(EntityKind::Activity), Ok(2));
        assert_eq!(repository.allocate_id(EntityKind::Passenger), Ok(1));
    }

    #[test]
    fn commit_saves_then_deletes() {
        let repository = InMemoryTravelRepository::default();
        let goa = Destination::new(DestinationId(1), "Goa").expect("valid");
        repository
            .commit(ChangeSet {
                saved: vec![Record::Destination(goa.clone())],
                deleted: Vec::new(),
            })
            .expect("commit succeeds");
        assert_eq!(
            repository.fetch_destination(DestinationId(1)),
            Ok(Some(goa))
        );

        repository
            .commit(ChangeSet {
                saved: Vec::new(),
                deleted: vec![EntityRef::Destination(DestinationId(1))],
            })
            .expect("commit succeeds");
        assert_eq!(repository.fetch_destination(DestinationId(1)), Ok(None));
        assert!(repository.destinations().expect("list").is_empty());
    }

    #[test]
    fn missing_records_are_absent_not_errors() {
        let repository = InMemoryTravelRepository::default();
        assert_eq!(repository.fetch_package(PackageId(7)), Ok(None));
        assert_eq!(repository.fetch_passenger(PassengerId(7)), Ok(None));
        repository
            .commit(ChangeSet {
                saved: Vec::new(),
                deleted: vec![EntityRef::Activity(ActivityId(7))],
            })
            .expect("deleting an absent record is a no-op");
    }
}
