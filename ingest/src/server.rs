// TCP listener and per-connection ingestion pipeline
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use fleetlink_avl::{decode_records, dispatch, Action};
use fleetlink_common::MetricsCollector;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::session::SessionTracker;
use crate::sink::SinkGateway;

/// Framing strategy for the inbound byte stream.
///
/// The production framer treats each TCP delivery as one complete logical
/// message; a message split across deliveries is not reassembled. The
/// trait exists so a length-prefixed framer can replace it without
/// touching the dispatcher or decoder.
pub trait Framing: Send {
    /// Feed one delivery; returns the messages now complete.
    fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>>;
}

/// One message per delivery. The buffer is drained whether or not the
/// message turns out to be usable, so a bad delivery never poisons the
/// next one.
#[derive(Default)]
pub struct PerDeliveryFraming {
    buffer: BytesMut,
}

impl Framing for PerDeliveryFraming {
    fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(data);
        vec![self.buffer.split().to_vec()]
    }
}

/// The ingest service: accepts connections, classifies messages, decodes
/// binary packets, and hands batches to the sink gateway.
pub struct IngestServer {
    tracker: Arc<SessionTracker>,
    sinks: Arc<SinkGateway>,
    metrics: Arc<MetricsCollector>,
    connection_seq: AtomicU64,
}

impl IngestServer {
    pub fn new(
        tracker: Arc<SessionTracker>,
        sinks: Arc<SinkGateway>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            tracker,
            sinks,
            metrics,
            connection_seq: AtomicU64::new(0),
        }
    }

    /// Accept connections forever. Accept errors are logged and do not
    /// stop the listener.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let id = self.connection_seq.fetch_add(1, Ordering::SeqCst);
                    info!("📡 Connection {} established from {}", id, peer);
                    self.metrics.record_connection_open();

                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, id).await;
                        server.metrics.record_connection_close();
                        info!("📡 Connection {} closed", id);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Read loop for one connection. Every decode, dispatch, or sink
    /// failure is contained here: the error is logged and the connection
    /// stays open. Only transport errors or peer close end the loop. No
    /// idle timeout is imposed.
    async fn handle_connection(&self, mut stream: TcpStream, connection_id: u64) {
        let mut framing = PerDeliveryFraming::default();
        let mut read_buffer = vec![0u8; 65536];

        loop {
            match stream.read(&mut read_buffer).await {
                Ok(0) => {
                    debug!("Connection {} closed by peer", connection_id);
                    break;
                }
                Ok(n) => {
                    debug!("Connection {} received {} bytes", connection_id, n);
                    for message in framing.push(&read_buffer[..n]) {
                        self.process_message(&message, connection_id).await;
                    }
                }
                Err(e) => {
                    error!("Connection {} read error: {}", connection_id, e);
                    break;
                }
            }
        }
    }

    async fn process_message(&self, message: &[u8], connection_id: u64) {
        match dispatch(message) {
            Ok(Action::ForwardBinary { payload, hint }) => {
                self.metrics.record_packet("binary");
                // identity carried alongside the payload applies first
                if !hint.is_empty() {
                    self.tracker.apply(&hint).await;
                }

                let outcome = decode_records(&payload);
                if let Some(e) = &outcome.error {
                    warn!(
                        "Connection {} decode error after {} fixes: {}",
                        connection_id,
                        outcome.fixes.len(),
                        e
                    );
                    self.metrics.record_error("decode", "truncated_packet");
                }
                if outcome.fixes.is_empty() {
                    return;
                }

                self.metrics.record_fixes(outcome.fixes.len());
                self.metrics.record_batch_size(outcome.fixes.len());

                let announcement = self.tracker.current().await;
                self.sinks.forward_batch(&outcome.fixes, &announcement).await;
            }
            Ok(Action::UpdateSession(hint)) => {
                self.metrics.record_packet("session");
                self.tracker.apply(&hint).await;
            }
            Ok(Action::Ignore) => {
                self.metrics.record_packet("ignored");
            }
            Err(e) => {
                warn!("Connection {} dropped message: {}", connection_id, e);
                self.metrics.record_error("dispatch", "malformed_handshake");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_delivery_framing_drains_buffer() {
        let mut framing = PerDeliveryFraming::default();

        let first = framing.push(b"hello");
        assert_eq!(first, vec![b"hello".to_vec()]);

        // nothing from the first delivery may leak into the second
        let second = framing.push(b"world");
        assert_eq!(second, vec![b"world".to_vec()]);
    }

    #[test]
    fn test_per_delivery_framing_passes_empty_delivery() {
        let mut framing = PerDeliveryFraming::default();
        assert_eq!(framing.push(b""), vec![Vec::<u8>::new()]);
    }
}
