//! Availability-monitoring subscriptions and pushes.
//!
//! A subscription ties the correlation id of a MonitorFacility call to the
//! caller's datagram source address. When a facility's occupancy changes,
//! every live subscriber receives an unsolicited push response carrying
//! the full weekly snapshot; the push echoes the subscriber's original
//! correlation id and is not part of any request/response exchange.
//!
//! Expiry is lazy: a subscription past its deadline is dropped the next
//! time its facility is notified.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bookwire_protocol::{keys, AvailabilitySnapshot, Response};
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::FacilityCatalog;
use crate::error::{Result, ServerError};

#[derive(Debug, Clone)]
struct Subscription {
    addr: SocketAddr,
    facility_id: i32,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct MonitoringService {
    catalog: Arc<FacilityCatalog>,
    /// Push-role socket, distinct from the request listener's.
    socket: UdpSocket,
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
    by_facility: RwLock<HashMap<i32, HashSet<Uuid>>>,
}

impl MonitoringService {
    pub async fn new(catalog: Arc<FacilityCatalog>) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        Ok(Self {
            catalog,
            socket,
            subscriptions: RwLock::new(HashMap::new()),
            by_facility: RwLock::new(HashMap::new()),
        })
    }

    /// Registers a subscriber for `duration_minutes` of pushes.
    pub async fn subscribe(
        &self,
        request_id: Uuid,
        addr: SocketAddr,
        facility_id: i32,
        duration_minutes: i32,
    ) -> Result<()> {
        if duration_minutes <= 0 {
            return Err(ServerError::MalformedRequest(
                "monitor duration must be positive".to_owned(),
            ));
        }
        self.subscribe_for(
            request_id,
            addr,
            facility_id,
            Duration::from_secs(duration_minutes as u64 * 60),
        )
        .await
    }

    pub(crate) async fn subscribe_for(
        &self,
        request_id: Uuid,
        addr: SocketAddr,
        facility_id: i32,
        duration: Duration,
    ) -> Result<()> {
        if !self.catalog.exists(facility_id).await {
            return Err(ServerError::UnavailableFacility(format!(
                "no facility with id {facility_id}"
            )));
        }

        let subscription = Subscription {
            addr,
            facility_id,
            expires_at: Instant::now() + duration,
        };
        self.subscriptions
            .write()
            .await
            .insert(request_id, subscription);
        self.by_facility
            .write()
            .await
            .entry(facility_id)
            .or_default()
            .insert(request_id);
        info!(%request_id, %addr, facility_id, "monitor subscription registered");
        Ok(())
    }

    pub async fn remove_subscription(&self, request_id: Uuid) {
        if let Some(subscription) = self.subscriptions.write().await.remove(&request_id) {
            if let Some(ids) = self
                .by_facility
                .write()
                .await
                .get_mut(&subscription.facility_id)
            {
                ids.remove(&request_id);
            }
        }
    }

    /// Pushes the snapshot to every live subscriber of its facility,
    /// dropping expired subscriptions on the way. Send failures are
    /// logged, not propagated: pushes are best-effort by design of the
    /// transport.
    pub async fn notify(&self, snapshot: &AvailabilitySnapshot) {
        let subscriber_ids = match self.by_facility.read().await.get(&snapshot.facility_id) {
            Some(ids) => ids.iter().copied().collect::<Vec<_>>(),
            None => return,
        };

        let payload = match snapshot.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%err, "failed to encode availability snapshot");
                return;
            }
        };

        for request_id in subscriber_ids {
            let subscription = match self.subscriptions.read().await.get(&request_id).cloned() {
                Some(subscription) => subscription,
                None => continue,
            };
            if Instant::now() >= subscription.expires_at {
                debug!(%request_id, "subscription expired");
                self.remove_subscription(request_id).await;
                continue;
            }

            let push = Response::success(
                request_id,
                [(keys::AVAILABILITY.to_owned(), payload.clone())].into(),
            );
            match push.encode() {
                Ok(bytes) => {
                    if let Err(err) = self.socket.send_to(&bytes, subscription.addr).await {
                        warn!(%err, addr = %subscription.addr, "failed to push update");
                    } else {
                        debug!(%request_id, addr = %subscription.addr, "pushed availability update");
                    }
                }
                Err(err) => warn!(%err, "failed to encode push response"),
            }
        }
    }

    /// Live (unexpired) subscriber count for a facility.
    pub async fn subscriber_count(&self, facility_id: i32) -> usize {
        let subscriptions = self.subscriptions.read().await;
        match self.by_facility.read().await.get(&facility_id) {
            Some(ids) => ids
                .iter()
                .filter(|id| {
                    subscriptions
                        .get(id)
                        .is_some_and(|s| Instant::now() < s.expires_at)
                })
                .count(),
            None => 0,
        }
    }
}
