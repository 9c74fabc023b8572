//! Operation dispatch.
//!
//! Maps a decoded request to a booking-engine or monitoring call and
//! builds the response. This is the outermost recovery boundary: every
//! failure the dispatcher can anticipate becomes a structured response,
//! and nothing here ever takes the server process down.

use std::net::SocketAddr;
use std::sync::Arc;

use bookwire_protocol::{keys, wire, Operation, Request, Response};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::booking::BookingEngine;
use crate::catalog::FacilityCatalog;
use crate::error::{Result, ServerError};
use crate::monitor::MonitoringService;

pub struct Dispatcher {
    engine: Arc<BookingEngine>,
    catalog: Arc<FacilityCatalog>,
    monitoring: Arc<MonitoringService>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<BookingEngine>,
        catalog: Arc<FacilityCatalog>,
        monitoring: Arc<MonitoringService>,
    ) -> Self {
        Self {
            engine,
            catalog,
            monitoring,
        }
    }

    /// Executes the request and always produces a response; errors are
    /// converted at this boundary.
    pub async fn dispatch(&self, request: &Request, source: SocketAddr) -> Response {
        debug!(operation = ?request.operation, request_id = %request.request_id, "dispatching");
        match self.handle(request, source).await {
            Ok(response) => response,
            Err(err) => error_response(request.request_id, &err),
        }
    }

    async fn handle(&self, request: &Request, source: SocketAddr) -> Result<Response> {
        let id = request.request_id;
        match request.operation {
            Operation::QueryAvailability => {
                let facility_id = param_i32(request, keys::FACILITY_ID)?;
                let start = param_i32(request, keys::CHECK_TIME_START)?;
                let end = param_i32(request, keys::CHECK_TIME_END)?;
                if self.engine.check_availability(facility_id, start, end).await? {
                    Ok(Response::ok(id))
                } else {
                    Err(ServerError::UnavailableFacility(format!(
                        "facility {facility_id} is not available during [{start}, {end})"
                    )))
                }
            }
            Operation::BookFacility => {
                let facility_id = param_i32(request, keys::FACILITY_ID)?;
                let start = param_i32(request, keys::BOOKING_START_TIME)?;
                let end = param_i32(request, keys::BOOKING_END_TIME)?;
                let booking = self.engine.book(facility_id, start, end).await?;
                self.push_availability(facility_id).await;
                Ok(Response::success(
                    id,
                    [(keys::BOOKING_ID.to_owned(), wire::encode_i32(booking.id))].into(),
                ))
            }
            Operation::ChangeBooking => {
                let booking_id = param_i32(request, keys::BOOKING_ID)?;
                let offset = param_i32(request, keys::OFFSET_TIME)?;
                let moved = self.engine.change(booking_id, offset).await?;
                self.push_availability(moved.facility_id).await;
                Ok(Response::ok(id))
            }
            Operation::ExtendBooking => {
                let booking_id = param_i32(request, keys::BOOKING_ID)?;
                let offset = param_i32(request, keys::OFFSET_TIME)?;
                let extended = self.engine.extend(booking_id, offset).await?;
                self.push_availability(extended.facility_id).await;
                Ok(Response::ok(id))
            }
            Operation::MonitorFacility => {
                let facility_id = param_i32(request, keys::FACILITY_ID)?;
                let duration = param_i32(request, keys::DURATION)?;
                self.monitoring
                    .subscribe(id, source, facility_id, duration)
                    .await?;
                Ok(Response::ok(id))
            }
            Operation::ListFacilities => {
                let facilities = self.catalog.list().await;
                let mut data = std::collections::BTreeMap::new();
                for (index, facility) in facilities.iter().enumerate() {
                    data.insert(
                        format!("{}{index}", keys::FACILITY_PREFIX),
                        facility.encode()?,
                    );
                }
                info!(count = facilities.len(), "listed facilities");
                Ok(Response::success(id, data))
            }
            Operation::Unknown => Err(ServerError::MalformedRequest(
                "unknown operation".to_owned(),
            )),
        }
    }

    /// Fans the facility's fresh snapshot out to monitoring subscribers.
    /// Export can only fail if the facility vanished since the mutation;
    /// there is nobody to notify in that case.
    async fn push_availability(&self, facility_id: i32) {
        if let Ok(snapshot) = self.engine.export_availability(facility_id).await {
            self.monitoring.notify(&snapshot).await;
        }
    }
}

fn param_i32(request: &Request, name: &str) -> Result<i32> {
    let blob = request.parameters.get(name).ok_or_else(|| {
        ServerError::MalformedRequest(format!(
            "missing parameter {name:?} for {:?}",
            request.operation
        ))
    })?;
    wire::decode_i32(blob).map_err(|err| {
        ServerError::MalformedRequest(format!("bad parameter {name:?}: {err}"))
    })
}

/// Converts a server error into the response the protocol prescribes.
///
/// Malformed and duplicate requests are protocol failures
/// (`status=false`); unavailable facilities/bookings are application
/// errors on a successful exchange (`status=true`). An internal
/// consistency fault is reported as an application error carrying its
/// classification and logged loudly; everything else is a generic
/// application error so an unanticipated failure never escapes as a crash.
pub fn error_response(request_id: Uuid, err: &ServerError) -> Response {
    match err {
        ServerError::MalformedRequest(_) | ServerError::DuplicateRequest | ServerError::Wire(_) => {
            Response::protocol_error(request_id, &err.to_string())
        }
        ServerError::UnavailableFacility(_) | ServerError::UnavailableBooking(_) => {
            Response::application_error(request_id, &err.to_string())
        }
        ServerError::Inconsistency(_) => {
            error!(%err, "internal consistency fault");
            Response::application_error(request_id, &err.to_string())
        }
        other => {
            error!(%other, "unanticipated dispatch failure");
            Response::application_error(request_id, &other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookwire_protocol::{Facility, FacilityType, ResponseOutcome};
    use std::collections::BTreeMap;

    async fn dispatcher_with_facility(facility_id: i32) -> Dispatcher {
        let catalog = Arc::new(FacilityCatalog::new());
        catalog
            .insert(Facility::new(
                facility_id,
                "Court 1",
                FacilityType::BadmintonCourt,
            ))
            .await;
        let engine = Arc::new(BookingEngine::new());
        engine.add_facility(facility_id).await;
        let monitoring = Arc::new(MonitoringService::new(Arc::clone(&catalog)).await.unwrap());
        Dispatcher::new(engine, catalog, monitoring)
    }

    fn source() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn request_with(operation: Operation, params: &[(&str, i32)]) -> Request {
        let parameters: BTreeMap<String, Vec<u8>> = params
            .iter()
            .map(|(name, value)| (name.to_string(), wire::encode_i32(*value)))
            .collect();
        Request::new(operation, parameters)
    }

    #[tokio::test]
    async fn book_then_query_then_change() {
        let dispatcher = dispatcher_with_facility(7).await;

        let book = request_with(
            Operation::BookFacility,
            &[
                (keys::FACILITY_ID, 7),
                (keys::BOOKING_START_TIME, 600),
                (keys::BOOKING_END_TIME, 630),
            ],
        );
        let response = dispatcher.dispatch(&book, source()).await;
        assert!(response.is_success());
        let booking_id = wire::decode_i32(&response.data[keys::BOOKING_ID]).unwrap();
        assert!(booking_id > 0);

        let query = request_with(
            Operation::QueryAvailability,
            &[
                (keys::FACILITY_ID, 7),
                (keys::CHECK_TIME_START, 600),
                (keys::CHECK_TIME_END, 630),
            ],
        );
        let response = dispatcher.dispatch(&query, source()).await;
        assert_eq!(response.outcome(), ResponseOutcome::ApplicationError);

        let change = request_with(
            Operation::ChangeBooking,
            &[(keys::BOOKING_ID, booking_id), (keys::OFFSET_TIME, 30)],
        );
        let response = dispatcher.dispatch(&change, source()).await;
        assert!(response.is_success());

        // The old range is free again, the new one is taken.
        let response = dispatcher.dispatch(&query, source()).await;
        assert!(response.is_success());
        let query_moved = request_with(
            Operation::QueryAvailability,
            &[
                (keys::FACILITY_ID, 7),
                (keys::CHECK_TIME_START, 630),
                (keys::CHECK_TIME_END, 660),
            ],
        );
        let response = dispatcher.dispatch(&query_moved, source()).await;
        assert_eq!(response.outcome(), ResponseOutcome::ApplicationError);
    }

    #[tokio::test]
    async fn missing_parameter_is_protocol_failure() {
        let dispatcher = dispatcher_with_facility(7).await;
        let request = request_with(Operation::BookFacility, &[(keys::FACILITY_ID, 7)]);
        let response = dispatcher.dispatch(&request, source()).await;
        assert_eq!(response.outcome(), ResponseOutcome::ProtocolError);
    }

    #[tokio::test]
    async fn unknown_operation_rejected_explicitly() {
        let dispatcher = dispatcher_with_facility(7).await;
        let request = Request::new(Operation::Unknown, BTreeMap::new());
        let response = dispatcher.dispatch(&request, source()).await;
        assert_eq!(response.outcome(), ResponseOutcome::ProtocolError);
        assert!(response.error_message().unwrap().contains("unknown operation"));
    }

    #[tokio::test]
    async fn unknown_facility_is_application_error() {
        let dispatcher = dispatcher_with_facility(7).await;
        let request = request_with(
            Operation::BookFacility,
            &[
                (keys::FACILITY_ID, 404),
                (keys::BOOKING_START_TIME, 0),
                (keys::BOOKING_END_TIME, 30),
            ],
        );
        let response = dispatcher.dispatch(&request, source()).await;
        assert_eq!(response.outcome(), ResponseOutcome::ApplicationError);
    }

    #[tokio::test]
    async fn list_facilities_enumerates_catalog() {
        let dispatcher = dispatcher_with_facility(7).await;
        let request = Request::new(Operation::ListFacilities, BTreeMap::new());
        let response = dispatcher.dispatch(&request, source()).await;
        assert!(response.is_success());
        let facility = Facility::decode(&response.data["facility-0"]).unwrap();
        assert_eq!(facility.id, 7);
        assert_eq!(facility.kind, FacilityType::BadmintonCourt);
    }

    #[tokio::test]
    async fn monitor_subscribes_source_address() {
        let dispatcher = dispatcher_with_facility(7).await;
        let request = request_with(
            Operation::MonitorFacility,
            &[(keys::FACILITY_ID, 7), (keys::DURATION, 5)],
        );
        let response = dispatcher.dispatch(&request, source()).await;
        assert!(response.is_success());
        assert_eq!(dispatcher.monitoring.subscriber_count(7).await, 1);
    }
}
