use crate::app_config::Discovery;
use crate::codec::{self, Flag};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

const DISCOVER_REQUEST: &[u8] = br#"{"op":101}"#;
const MAX_DATAGRAM: usize = 1024;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryResponse {
    pub op: Option<i64>,
    pub data: Option<GatewayDiscoveryInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayDiscoveryInfo {
    pub ip: Option<String>,
    pub link_enabled: Option<Flag>,
    pub link_remain_ms: Option<u64>,
    pub mac: Option<String>,
    pub model: Option<String>,
    pub name: Option<String>,
    pub reset_id: Option<String>,
    pub version: Option<String>,
}

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("no gateway answered within {0:?}")]
    Timeout(Duration),
    #[error("discovery socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broadcasts a discovery request and waits for the first gateway to answer.
///
/// The socket listens on the discovery port, so it also receives its own broadcast.
/// Datagrams without a `data` section are skipped.
#[instrument(skip(config))]
pub async fn discover(config: &Discovery) -> Result<DiscoveryResponse, DiscoverError> {
    info!("🔍 Discovering gateways...");
    let socket = UdpSocket::bind(config.listen_address()).await?;
    socket.set_broadcast(true)?;
    socket.send_to(DISCOVER_REQUEST, config.broadcast_address()).await?;

    let deadline = Instant::now() + config.timeout();
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, from) = tokio::time::timeout_at(deadline, socket.recv_from(&mut buf))
            .await
            .map_err(|_| DiscoverError::Timeout(config.timeout()))??;

        match codec::decode_slice::<DiscoveryResponse>(&buf[..len]) {
            Ok(response) if response.data.is_some() => {
                info!(%from, "🔍 Discovering gateways... OK, found {:?}", response.data.as_ref().and_then(|d| d.ip.as_deref()));
                return Ok(response);
            }
            Ok(_) => debug!(%from, "Skipping datagram without gateway data"),
            Err(e) => debug!(%from, "Skipping undecodable datagram: {}", e),
        }
    }
}
