// TCP announcement client for the ingest service
use fleetlink_common::{Handshake, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Send a session announcement to the ingest listener. Fire and forget:
/// a connection failure is logged and never fails the upload that
/// triggered it.
pub async fn announce(ingest_addr: &str, handshake: &Handshake) {
    match try_announce(ingest_addr, handshake).await {
        Ok(bytes) => debug!("Announced session to {} ({} bytes)", ingest_addr, bytes),
        Err(e) => warn!("Failed to announce session to {}: {}", ingest_addr, e),
    }
}

async fn try_announce(ingest_addr: &str, handshake: &Handshake) -> Result<usize> {
    let payload = serde_json::to_vec(handshake)?;
    let mut stream = TcpStream::connect(ingest_addr).await?;
    stream.write_all(&payload).await?;
    stream.shutdown().await?;
    Ok(payload.len())
}
