use std::sync::Arc;

use axum::response::Response;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::packages::activity::Activity;
use crate::packages::destination::Destination;
use crate::packages::domain::{
    ActivityId, DestinationId, EntityKind, Money, NewActivity, NewDestination, NewPackage,
    NewPassenger, PackageId, PassengerId,
};
use crate::packages::memory::InMemoryTravelRepository;
use crate::packages::package::TravelPackage;
use crate::packages::passenger::Passenger;
use crate::packages::policy::BookingPolicy;
use crate::packages::pricing::Tier;
use crate::packages::repository::{ChangeSet, RepositoryError, TravelRepository};
use crate::packages::{packages_router, TravelPackageService};

pub(super) fn money(amount: i64) -> Money {
    Decimal::from(amount)
}

pub(super) fn new_activity(name: &str, cost: i64, capacity: u32) -> NewActivity {
    NewActivity {
        name: name.to_string(),
        description: format!("{name} with a local guide"),
        cost: money(cost),
        capacity,
    }
}

pub(super) fn new_passenger(name: &str, tier: Tier, balance: i64) -> NewPassenger {
    NewPassenger {
        name: name.to_string(),
        number: format!("P-{}", name.to_ascii_uppercase()),
        tier,
        balance: money(balance),
    }
}

pub(super) fn build_service() -> (
    TravelPackageService<InMemoryTravelRepository>,
    Arc<InMemoryTravelRepository>,
) {
    build_service_with(BookingPolicy::default())
}

pub(super) fn build_service_with(
    policy: BookingPolicy,
) -> (
    TravelPackageService<InMemoryTravelRepository>,
    Arc<InMemoryTravelRepository>,
) {
    let repository = Arc::new(InMemoryTravelRepository::default());
    let service = TravelPackageService::new(repository.clone(), policy);
    (service, repository)
}

/// Ids created by [`seed_goa`].
pub(super) struct GoaTrip {
    pub(super) goa: DestinationId,
    pub(super) beach_party: ActivityId,
    pub(super) scuba: ActivityId,
    pub(super) rahul: PassengerId,
    pub(super) sonia: PassengerId,
    pub(super) package: PackageId,
}

/// Goa with a beach party and a scuba dive, two passengers enrolled in one package.
pub(super) fn seed_goa(service: &TravelPackageService<InMemoryTravelRepository>) -> GoaTrip {
    let beach_party = service
        .create_activity(new_activity("Beach Party", 2000, 10))
        .expect("beach party created");
    let scuba = service
        .create_activity(new_activity("Scuba Diving", 1000, 2))
        .expect("scuba created");
    let goa = service
        .create_destination(NewDestination {
            name: "Goa".to_string(),
            activity_ids: vec![beach_party.id, scuba.id],
        })
        .expect("goa created");
    let rahul = service
        .create_passenger(new_passenger("Rahul", Tier::Standard, 50000))
        .expect("rahul created");
    let sonia = service
        .create_passenger(new_passenger("Sonia", Tier::Gold, 10000))
        .expect("sonia created");
    let package = service
        .create_package(NewPackage {
            name: "Goa Getaway".to_string(),
            passenger_capacity: 4,
            destination_ids: vec![goa.id],
            passenger_ids: vec![rahul.id, sonia.id],
        })
        .expect("package created");

    GoaTrip {
        goa: goa.id,
        beach_party: beach_party.id,
        scuba: scuba.id,
        rahul: rahul.id,
        sonia: sonia.id,
        package: package.id,
    }
}

/// Store whose reads work but whose commits always fail.
#[derive(Default, Clone)]
pub(super) struct ReadOnlyRepository {
    pub(super) inner: InMemoryTravelRepository,
}

impl TravelRepository for ReadOnlyRepository {
    fn allocate_id(&self, kind: EntityKind) -> Result<u64, RepositoryError> {
        self.inner.allocate_id(kind)
    }

    fn fetch_activity(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError> {
        self.inner.fetch_activity(id)
    }

    fn fetch_destination(
        &self,
        id: DestinationId,
    ) -> Result<Option<Destination>, RepositoryError> {
        self.inner.fetch_destination(id)
    }

    fn fetch_passenger(&self, id: PassengerId) -> Result<Option<Passenger>, RepositoryError> {
        self.inner.fetch_passenger(id)
    }

    fn fetch_package(&self, id: PackageId) -> Result<Option<TravelPackage>, RepositoryError> {
        self.inner.fetch_package(id)
    }

    fn activities(&self) -> Result<Vec<Activity>, RepositoryError> {
        self.inner.activities()
    }

    fn destinations(&self) -> Result<Vec<Destination>, RepositoryError> {
        self.inner.destinations()
    }

    fn passengers(&self) -> Result<Vec<Passenger>, RepositoryError> {
        self.inner.passengers()
    }

    fn packages(&self) -> Result<Vec<TravelPackage>, RepositoryError> {
        self.inner.packages()
    }

    fn commit(&self, _changes: ChangeSet) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict)
    }
}

pub(super) struct UnavailableRepository;

impl TravelRepository for UnavailableRepository {
    fn allocate_id(&self, _kind: EntityKind) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_activity(&self, _id: ActivityId) -> Result<Option<Activity>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_destination(
        &self,
        _id: DestinationId,
    ) -> Result<Option<Destination>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_passenger(&self, _id: PassengerId) -> Result<Option<Passenger>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_package(&self, _id: PackageId) -> Result<Option<TravelPackage>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn activities(&self) -> Result<Vec<Activity>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn destinations(&self) -> Result<Vec<Destination>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn passengers(&self) -> Result<Vec<Passenger>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn packages(&self) -> Result<Vec<TravelPackage>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit(&self, _changes: ChangeSet) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Parse a JSON decimal, which serializes as a string.
pub(super) fn decimal_field(payload: &Value, field: &str) -> Decimal {
    payload
        .get(field)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| panic!("{field} is not a decimal in {payload}"))
}

pub(super) fn router_with_service(
    service: TravelPackageService<InMemoryTravelRepository>,
) -> axum::Router {
    packages_router(Arc::new(service))
}
