//! UDP request listener.
//!
//! One receive loop owns the listening socket. Each surviving datagram is
//! handed to a spawned task so receive throughput is never blocked by
//! business-logic latency; the engine's per-facility locks make that safe.
//! Requests across distinct correlation ids carry no ordering guarantee.

use std::net::SocketAddr;
use std::sync::Arc;

use bookwire_protocol::{Request, Response};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::dedup::{DedupCache, SWEEP_PERIOD};
use crate::dispatch::{error_response, Dispatcher};
use crate::error::{Result, ServerError};
use crate::faults::{LossSimulator, ResponseWithholder};

/// Largest datagram the listener will accept. UDP itself caps payloads
/// well below the codec's 24-bit ceiling.
pub const RECV_BUFFER_SIZE: usize = 64 * 1024;

pub struct Server {
    at_most_once: bool,
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    dedup: Arc<DedupCache>,
    loss: LossSimulator,
    withholder: Arc<ResponseWithholder>,
}

impl Server {
    /// Binds the listening socket and assembles the reliability layer
    /// around the dispatcher.
    pub async fn bind(
        config: &ServerConfig,
        dispatcher: Arc<Dispatcher>,
        dedup: Arc<DedupCache>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", config.port)).await?;
        Ok(Self {
            at_most_once: config.at_most_once,
            socket: Arc::new(socket),
            dispatcher,
            dedup,
            loss: LossSimulator::new(config.message_drop_rate),
            withholder: Arc::new(ResponseWithholder::new(config.response_withhold)),
        })
    }

    /// The address the listener actually bound (port 0 resolves here).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Runs the receive loop until the socket fails.
    pub async fn run(self) -> Result<()> {
        let local = self.local_addr()?;
        info!(%local, at_most_once = self.at_most_once, "server listening");

        let sweeper = self.dedup.spawn_sweeper(SWEEP_PERIOD);
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(err) => {
                    sweeper.abort();
                    return Err(ServerError::Io(err));
                }
            };
            if self.loss.should_drop() {
                info!(%peer, "simulated message loss, dropping datagram");
                continue;
            }

            let datagram = buf[..len].to_vec();
            let socket = Arc::clone(&self.socket);
            let dispatcher = Arc::clone(&self.dispatcher);
            let dedup = Arc::clone(&self.dedup);
            let withholder = Arc::clone(&self.withholder);
            let at_most_once = self.at_most_once;
            tokio::spawn(async move {
                handle_datagram(
                    socket,
                    dispatcher,
                    dedup,
                    withholder,
                    at_most_once,
                    datagram,
                    peer,
                )
                .await;
            });
        }
    }
}

async fn handle_datagram(
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    dedup: Arc<DedupCache>,
    withholder: Arc<ResponseWithholder>,
    at_most_once: bool,
    datagram: Vec<u8>,
    peer: SocketAddr,
) {
    let response = match Request::decode(&datagram) {
        Err(err) => {
            warn!(%peer, %err, "undecodable request");
            // No correlation id could be recovered; echo the nil id.
            Response::protocol_error(Uuid::nil(), &format!("malformed request: {err}"))
        }
        Ok(request) => {
            debug!(%peer, request_id = %request.request_id, "received request");
            if at_most_once {
                if dedup.is_duplicate(request.request_id).await && !request.is_idempotent() {
                    info!(request_id = %request.request_id, "duplicate non-idempotent request suppressed");
                    error_response(request.request_id, &ServerError::DuplicateRequest)
                } else {
                    dedup.record(request.request_id).await;
                    dispatcher.dispatch(&request, peer).await
                }
            } else {
                dispatcher.dispatch(&request, peer).await
            }
        }
    };

    let bytes = match response.encode() {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, "response serialization failed");
            return;
        }
    };
    if withholder.should_withhold() {
        info!(%peer, "withholding response");
        return;
    }
    if let Err(err) = socket.send_to(&bytes, peer).await {
        warn!(%peer, %err, "failed to send response");
    }
}
