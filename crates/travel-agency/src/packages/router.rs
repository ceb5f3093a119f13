use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ActivityChanges, ActivityId, BookingError, DestinationChanges, DestinationId, NewActivity,
    NewDestination, NewPackage, NewPassenger, PackageChanges, PackageId, PassengerChanges,
    PassengerId,
};
use super::repository::{RepositoryError, TravelRepository};
use super::service::{PackageServiceError, TravelPackageService};

type Shared<R> = State<Arc<TravelPackageService<R>>>;

/// Router builder exposing the booking operations over HTTP.
pub fn packages_router<R>(service: Arc<TravelPackageService<R>>) -> Router
where
    R: TravelRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/activities",
            get(list_activities::<R>).post(create_activity::<R>),
        )
        .route(
            "/api/v1/activities/:activity_id",
            get(get_activity::<R>)
                .patch(update_activity::<R>)
                .delete(delete_activity::<R>),
        )
        .route(
            "/api/v1/destinations",
            get(list_destinations::<R>).post(create_destination::<R>),
        )
        .route(
            "/api/v1/destinations/:destination_id",
            get(get_destination::<R>)
                .patch(update_destination::<R>)
                .delete(delete_destination::<R>),
        )
        .route(
            "/api/v1/destinations/:destination_id/activities/:activity_id",
            post(attach_activity::<R>).delete(detach_activity::<R>),
        )
        .route(
            "/api/v1/passengers",
            get(list_passengers::<R>).post(create_passenger::<R>),
        )
        .route(
            "/api/v1/passengers/:passenger_id",
            get(get_passenger::<R>)
                .patch(update_passenger::<R>)
                .delete(delete_passenger::<R>),
        )
        .route(
            "/api/v1/passengers/:passenger_id/activities/:activity_id",
            post(sign_up::<R>).delete(cancel::<R>),
        )
        .route(
            "/api/v1/passengers/:passenger_id/statement",
            get(statement::<R>),
        )
        .route(
            "/api/v1/packages",
            get(list_packages::<R>).post(create_package::<R>),
        )
        .route(
            "/api/v1/packages/:package_id",
            get(get_package::<R>)
                .patch(update_package::<R>)
                .delete(delete_package::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/destinations",
            get(package_destinations::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/destinations/:destination_id",
            post(add_destination::<R>).delete(remove_destination::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/passengers",
            get(package_passengers::<R>).post(add_passengers::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/passengers/remove",
            post(remove_passengers::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/passengers/:passenger_id",
            post(add_passenger::<R>).delete(remove_passenger::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/passengers/:passenger_id/activities/:activity_id",
            post(add_activity_to_passenger::<R>).delete(remove_activity_from_passenger::<R>),
        )
        .route(
            "/api/v1/packages/:package_id/itinerary",
            get(itinerary::<R>),
        )
        .route("/api/v1/packages/:package_id/manifest", get(manifest::<R>))
        .route(
            "/api/v1/packages/:package_id/availability",
            get(availability::<R>),
        )
        .with_state(service)
}

/// Body of the bulk passenger endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerBatch {
    pub passenger_ids: Vec<PassengerId>,
}

pub(crate) fn status_for(error: &PackageServiceError) -> StatusCode {
    match error {
        PackageServiceError::Booking(BookingError::NotFound(_)) => StatusCode::NOT_FOUND,
        PackageServiceError::Booking(BookingError::InvalidArgument(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PackageServiceError::Booking(_) => StatusCode::CONFLICT,
        PackageServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PackageServiceError::Repository(RepositoryError::Conflict)
        | PackageServiceError::Invariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T, PackageServiceError>, success: StatusCode) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (status_for(&error), Json(payload)).into_response()
        }
    }
}

fn respond_empty(result: Result<(), PackageServiceError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => respond::<()>(Err(error), StatusCode::NO_CONTENT),
    }
}

pub(crate) async fn list_activities<R>(State(service): Shared<R>) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.activities(), StatusCode::OK)
}

pub(crate) async fn create_activity<R>(
    State(service): Shared<R>,
    Json(draft): Json<NewActivity>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.create_activity(draft), StatusCode::CREATED)
}

pub(crate) async fn get_activity<R>(
    State(service): Shared<R>,
    Path(activity_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.activity(ActivityId(activity_id)), StatusCode::OK)
}

pub(crate) async fn update_activity<R>(
    State(service): Shared<R>,
    Path(activity_id): Path<u64>,
    Json(changes): Json<ActivityChanges>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.update_activity(ActivityId(activity_id), changes),
        StatusCode::OK,
    )
}

pub(crate) async fn delete_activity<R>(
    State(service): Shared<R>,
    Path(activity_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond_empty(service.delete_activity(ActivityId(activity_id)))
}

pub(crate) async fn list_destinations<R>(State(service): Shared<R>) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.destinations(), StatusCode::OK)
}

pub(crate) async fn create_destination<R>(
    State(service): Shared<R>,
    Json(draft): Json<NewDestination>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.create_destination(draft), StatusCode::CREATED)
}

pub(crate) async fn get_destination<R>(
    State(service): Shared<R>,
    Path(destination_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.destination(DestinationId(destination_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn update_destination<R>(
    State(service): Shared<R>,
    Path(destination_id): Path<u64>,
    Json(changes): Json<DestinationChanges>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.update_destination(DestinationId(destination_id), changes),
        StatusCode::OK,
    )
}

pub(crate) async fn delete_destination<R>(
    State(service): Shared<R>,
    Path(destination_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond_empty(service.delete_destination(DestinationId(destination_id)))
}

pub(crate) async fn attach_activity<R>(
    State(service): Shared<R>,
    Path((destination_id, activity_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.add_activity_to_destination(
            DestinationId(destination_id),
            ActivityId(activity_id),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn detach_activity<R>(
    State(service): Shared<R>,
    Path((destination_id, activity_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.remove_activity_from_destination(
            DestinationId(destination_id),
            ActivityId(activity_id),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn list_passengers<R>(State(service): Shared<R>) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.passengers(), StatusCode::OK)
}

pub(crate) async fn create_passenger<R>(
    State(service): Shared<R>,
    Json(draft): Json<NewPassenger>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.create_passenger(draft), StatusCode::CREATED)
}

pub(crate) async fn get_passenger<R>(
    State(service): Shared<R>,
    Path(passenger_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.passenger(PassengerId(passenger_id)), StatusCode::OK)
}

pub(crate) async fn update_passenger<R>(
    State(service): Shared<R>,
    Path(passenger_id): Path<u64>,
    Json(changes): Json<PassengerChanges>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.update_passenger(PassengerId(passenger_id), changes),
        StatusCode::OK,
    )
}

pub(crate) async fn delete_passenger<R>(
    State(service): Shared<R>,
    Path(passenger_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond_empty(service.delete_passenger(PassengerId(passenger_id)))
}

pub(crate) async fn sign_up<R>(
    State(service): Shared<R>,
    Path((passenger_id, activity_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.sign_up(PassengerId(passenger_id), ActivityId(activity_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn cancel<R>(
    State(service): Shared<R>,
    Path((passenger_id, activity_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.cancel(PassengerId(passenger_id), ActivityId(activity_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn statement<R>(
    State(service): Shared<R>,
    Path(passenger_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.statement(PassengerId(passenger_id)), StatusCode::OK)
}

pub(crate) async fn list_packages<R>(State(service): Shared<R>) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.packages(), StatusCode::OK)
}

pub(crate) async fn create_package<R>(
    State(service): Shared<R>,
    Json(draft): Json<NewPackage>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.create_package(draft), StatusCode::CREATED)
}

pub(crate) async fn get_package<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.package(PackageId(package_id)), StatusCode::OK)
}

pub(crate) async fn update_package<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
    Json(changes): Json<PackageChanges>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.update_package(PackageId(package_id), changes),
        StatusCode::OK,
    )
}

pub(crate) async fn delete_package<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond_empty(service.delete_package(PackageId(package_id)))
}

pub(crate) async fn package_destinations<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.package_destinations(PackageId(package_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn add_destination<R>(
    State(service): Shared<R>,
    Path((package_id, destination_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.add_destination_to_package(PackageId(package_id), DestinationId(destination_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn remove_destination<R>(
    State(service): Shared<R>,
    Path((package_id, destination_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.remove_destination_from_package(
            PackageId(package_id),
            DestinationId(destination_id),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn package_passengers<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.package_passengers(PackageId(package_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn add_passengers<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
    Json(batch): Json<PassengerBatch>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.add_passengers_to_package(PackageId(package_id), &batch.passenger_ids),
        StatusCode::OK,
    )
}

pub(crate) async fn remove_passengers<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
    Json(batch): Json<PassengerBatch>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.remove_passengers_from_package(PackageId(package_id), &batch.passenger_ids),
        StatusCode::OK,
    )
}

pub(crate) async fn add_passenger<R>(
    State(service): Shared<R>,
    Path((package_id, passenger_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.add_passenger_to_package(PackageId(package_id), PassengerId(passenger_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn remove_passenger<R>(
    State(service): Shared<R>,
    Path((package_id, passenger_id)): Path<(u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.remove_passenger_from_package(PackageId(package_id), PassengerId(passenger_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn add_activity_to_passenger<R>(
    State(service): Shared<R>,
    Path((package_id, passenger_id, activity_id)): Path<(u64, u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.add_activity_to_passenger(
            PackageId(package_id),
            PassengerId(passenger_id),
            ActivityId(activity_id),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn remove_activity_from_passenger<R>(
    State(service): Shared<R>,
    Path((package_id, passenger_id, activity_id)): Path<(u64, u64, u64)>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(
        service.remove_activity_from_passenger(
            PackageId(package_id),
            PassengerId(passenger_id),
            ActivityId(activity_id),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn itinerary<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.itinerary(PackageId(package_id)), StatusCode::OK)
}

pub(crate) async fn manifest<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.manifest(PackageId(package_id)), StatusCode::OK)
}

pub(crate) async fn availability<R>(
    State(service): Shared<R>,
    Path(package_id): Path<u64>,
) -> Response
where
    R: TravelRepository + 'static,
{
    respond(service.availability(PackageId(package_id)), StatusCode::OK)
}
