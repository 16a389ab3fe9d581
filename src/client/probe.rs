//! TCP-connect latency probe
//!
//! ICMP echo needs raw sockets and elevated privileges, so the probe times a
//! TCP handshake instead. Name resolution happens before the clock starts.

use super::LatencyProbe;
use crate::{
    defaults::{DEFAULT_PING_PORT, DEFAULT_PROBE_TIMEOUT},
    error::Result,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

/// Times a TCP connect to `host:port`
#[derive(Debug, Clone)]
pub struct TcpLatencyProbe {
    port: u16,
    timeout: Duration,
}

impl TcpLatencyProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for TcpLatencyProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PING_PORT, DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl LatencyProbe for TcpLatencyProbe {
    async fn probe_latency(&self, host: &str) -> Result<Option<f64>> {
        let address = match lookup_host((host, self.port)).await {
            Ok(mut addresses) => match addresses.next() {
                Some(address) => address,
                None => return Ok(None),
            },
            // Unresolvable counts as no answer, like an unreachable host
            Err(_) => return Ok(None),
        };

        let start = Instant::now();
        match timeout(self.timeout, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => Ok(Some(start.elapsed().as_secs_f64() * 1000.0)),
            Ok(Err(_)) | Err(_) => Ok(None),
        }
    }
}
