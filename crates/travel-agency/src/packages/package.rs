use serde::{Deserialize, Serialize};

use super::domain::{
    require_name, BookingError, DestinationId, PackageChanges, PackageId, PassengerId,
};
use super::policy::PackageCapacityPolicy;

/// Aggregate of destinations on offer and the passengers enrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPackage {
    pub id: PackageId,
    pub name: String,
    pub passenger_capacity: u32,
    pub destinations: Vec<DestinationId>,
    pub passengers: Vec<PassengerId>,
}

impl TravelPackage {
    pub fn new(id: PackageId, name: &str, passenger_capacity: u32) -> Result<Self, BookingError> {
        Ok(Self {
            id,
            name: require_name("package name", name)?,
            passenger_capacity,
            destinations: Vec::new(),
            passengers: Vec::new(),
        })
    }

    pub fn includes_destination(&self, destination: DestinationId) -> bool {
        self.destinations.contains(&destination)
    }

    pub fn includes_passenger(&self, passenger: PassengerId) -> bool {
        self.passengers.contains(&passenger)
    }

    pub fn open_seats(&self) -> u32 {
        let enrolled = u32::try_from(self.passengers.len()).unwrap_or(u32::MAX);
        self.passenger_capacity.saturating_sub(enrolled)
    }

    /// Fails with `PackageFull` when `additional` more passengers would not fit.
    pub(crate) fn ensure_room(
        &self,
        additional: usize,
        policy: PackageCapacityPolicy,
    ) -> Result<(), BookingError> {
        if policy == PackageCapacityPolicy::Advisory {
            return Ok(());
        }
        let capacity = self.passenger_capacity as usize;
        if self.passengers.len() + additional > capacity {
            return Err(BookingError::PackageFull {
                package: self.id,
                capacity: self.passenger_capacity,
            });
        }
        Ok(())
    }

    pub(crate) fn insert_destination(&mut self, destination: DestinationId) -> bool {
        if self.includes_destination(destination) {
            return false;
        }
        self.destinations.push(destination);
        true
    }

    pub(crate) fn remove_destination(&mut self, destination: DestinationId) -> bool {
        let before = self.destinations.len();
        self.destinations.retain(|listed| *listed != destination);
        before != self.destinations.len()
    }

    pub(crate) fn insert_passenger(&mut self, passenger: PassengerId) -> bool {
        if self.includes_passenger(passenger) {
            return false;
        }
        self.passengers.push(passenger);
        true
    }

    pub(crate) fn remove_passenger(&mut self, passenger: PassengerId) -> bool {
        let before = self.passengers.len();
        self.passengers.retain(|enrolled| *enrolled != passenger);
        before != self.passengers.len()
    }

    pub(crate) fn apply(
        &mut self,
        changes: PackageChanges,
        policy: PackageCapacityPolicy,
    ) -> Result<(), BookingError> {
        let name = changes
            .name
            .map(|name| require_name("package name", &name))
            .transpose()?;

        if let Some(capacity) = changes.passenger_capacity {
            if policy == PackageCapacityPolicy::Enforced && (capacity as usize) < self.passengers.len()
            {
                return Err(BookingError::invalid(format!(
                    "passenger capacity {capacity} is below the {} passengers already enrolled",
                    self.passengers.len()
                )));
            }
            self.passenger_capacity = capacity;
        }
        if let Some(name) = name {
            self.name = name;
        }
        Ok(())
    }
}
