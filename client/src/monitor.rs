//! Long-lived listener for availability pushes.
//!
//! The listener owns its own socket (one socket per logical role) and
//! sends the MonitorFacility request from it, so the server records that
//! socket's address as the push destination. It then loops on
//! receive-with-short-timeout until the wall-clock deadline or an explicit
//! cancellation, filtering inbound packets by the subscription's
//! correlation id before interpreting them.

use std::sync::Arc;
use std::time::Duration;

use bookwire_protocol::{AvailabilitySnapshot, Response};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::requests;
use crate::responses;
use crate::service::{self, RECV_BUFFER_SIZE};

/// Poll granularity of the listener loop; also bounds how quickly
/// cancellation and deadline expiry are observed.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// A running monitoring subscription.
///
/// Updates arrive on [`next_update`]; the session ends when its duration
/// elapses, when [`cancel`] is called, or when the session is dropped.
///
/// [`next_update`]: MonitorSession::next_update
/// [`cancel`]: MonitorSession::cancel
pub struct MonitorSession {
    /// The server's acknowledgment of the subscription.
    pub ack: Response,
    updates: mpsc::Receiver<AvailabilitySnapshot>,
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MonitorSession {
    /// Subscribes to availability updates for a facility.
    ///
    /// Returns once the server acknowledges (or refuses) the
    /// subscription; on refusal the session carries the error response
    /// and will produce no updates.
    pub async fn start(
        config: &ClientConfig,
        facility_id: i32,
        duration_minutes: i32,
    ) -> Result<Self> {
        let server_addr = service::resolve(&config.server_addr).await?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;

        let request = requests::monitor_facility(facility_id, duration_minutes);
        let request_id = request.request_id;
        let ack = service::exchange(
            &socket,
            server_addr,
            &request,
            service::REQUEST_TIMEOUT,
            service::MAX_ATTEMPTS,
        )
        .await?;

        let deadline = Instant::now() + Duration::from_secs(duration_minutes.max(0) as u64 * 60);
        let (tx, updates) = mpsc::channel(16);
        let cancel = Arc::new(Notify::new());
        let listening = ack.is_success();
        let cancel_signal = Arc::clone(&cancel);
        let task = tokio::spawn(async move {
            if listening {
                listen(socket, request_id, deadline, cancel_signal, tx).await;
            }
        });

        Ok(Self {
            ack,
            updates,
            cancel,
            task,
        })
    }

    /// The next snapshot push, or `None` once the session has ended.
    pub async fn next_update(&mut self) -> Option<AvailabilitySnapshot> {
        self.updates.recv().await
    }

    /// Signals the listener to exit before its deadline.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Waits for the listener to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn listen(
    socket: UdpSocket,
    request_id: uuid::Uuid,
    deadline: Instant,
    cancel: Arc<Notify>,
    tx: mpsc::Sender<AvailabilitySnapshot>,
) {
    info!(%request_id, "monitor listener started");
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    loop {
        if Instant::now() >= deadline {
            info!(%request_id, "monitor deadline reached");
            return;
        }
        tokio::select! {
            _ = cancel.notified() => {
                info!(%request_id, "monitor cancelled");
                return;
            }
            received = timeout(POLL_TIMEOUT, socket.recv_from(&mut buf)) => {
                let (len, peer) = match received {
                    Err(_elapsed) => continue,
                    Ok(Err(err)) => {
                        warn!(%err, "monitor socket failed");
                        return;
                    }
                    Ok(Ok(received)) => received,
                };
                let push = match Response::decode(&buf[..len]) {
                    Ok(push) => push,
                    Err(err) => {
                        warn!(%peer, %err, "undecodable push ignored");
                        continue;
                    }
                };
                // Correlation is purely by the embedded id.
                if push.request_id != request_id {
                    debug!(%peer, "push for another subscription ignored");
                    continue;
                }
                match responses::availability(&push) {
                    Ok(snapshot) => {
                        if tx.send(snapshot).await.is_err() {
                            // Receiver dropped; nobody is watching anymore.
                            return;
                        }
                    }
                    Err(err) => warn!(%err, "push without usable snapshot ignored"),
                }
            }
        }
    }
}
