//! Synchronous request/response caller.
//!
//! Transport retry is always active: a request is sent and a response
//! awaited under a fixed timeout, resending on silence, up to a bounded
//! number of attempts. On top of that, at-most-once mode adds a local
//! response cache so an identical resend is answered without touching the
//! network at all.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use bookwire_protocol::{Request, Response};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// How long one attempt waits for a response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Total send attempts before surfacing a transport failure.
pub const MAX_ATTEMPTS: u32 = 3;

/// Receive buffer for responses and pushes.
pub const RECV_BUFFER_SIZE: usize = 8 * 1024;

pub struct ClientService {
    socket: UdpSocket,
    server_addr: SocketAddr,
    at_most_once: bool,
    attempt_timeout: Duration,
    max_attempts: u32,
    response_cache: Mutex<HashMap<Uuid, Response>>,
}

impl ClientService {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let server_addr = resolve(&config.server_addr).await?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        Ok(Self {
            socket,
            server_addr,
            at_most_once: config.at_most_once,
            attempt_timeout: REQUEST_TIMEOUT,
            max_attempts: MAX_ATTEMPTS,
            response_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Overrides the retry policy; mainly for exercising the retry bound
    /// without waiting out full production timeouts.
    pub fn with_retry_policy(mut self, attempt_timeout: Duration, max_attempts: u32) -> Self {
        self.attempt_timeout = attempt_timeout;
        self.max_attempts = max_attempts;
        self
    }

    /// Sends the request and returns the matching response.
    ///
    /// With at-most-once enabled, an identical resend (same correlation
    /// id) short-circuits through the cache. Retry cancels only by
    /// exhausting its attempt budget, which surfaces as
    /// [`ClientError::TransportFailure`].
    pub async fn send(&self, request: &Request) -> Result<Response> {
        if self.at_most_once {
            if let Some(hit) = self.response_cache.lock().await.get(&request.request_id) {
                debug!(request_id = %request.request_id, "response served from cache");
                return Ok(hit.clone());
            }
        }

        let response =
            exchange(&self.socket, self.server_addr, request, self.attempt_timeout, self.max_attempts)
                .await?;

        if self.at_most_once {
            self.response_cache
                .lock()
                .await
                .insert(request.request_id, response.clone());
        }
        Ok(response)
    }
}

/// One request/response exchange over `socket` with timeout and resend.
/// Shared between the caller and the monitor listener's subscribe step.
pub(crate) async fn exchange(
    socket: &UdpSocket,
    server_addr: SocketAddr,
    request: &Request,
    attempt_timeout: Duration,
    max_attempts: u32,
) -> Result<Response> {
    let bytes = request.encode()?;
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    for attempt in 1..=max_attempts {
        socket.send_to(&bytes, server_addr).await?;
        match timeout(attempt_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _peer))) => {
                let response = Response::decode(&buf[..len])?;
                debug!(request_id = %response.request_id, attempt, "response received");
                return Ok(response);
            }
            Ok(Err(err)) => return Err(err.into()),
            Err(_elapsed) => {
                warn!(
                    request_id = %request.request_id,
                    attempt,
                    max_attempts,
                    "request timed out"
                );
            }
        }
    }
    Err(ClientError::TransportFailure {
        attempts: max_attempts,
    })
}

pub(crate) async fn resolve(server_addr: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(server_addr)
        .await
        .map_err(|_| ClientError::BadServerAddress(server_addr.to_owned()))?
        .next()
        .ok_or_else(|| ClientError::BadServerAddress(server_addr.to_owned()))
}
