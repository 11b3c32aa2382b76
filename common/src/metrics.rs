// Metrics collection for monitoring
use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct MetricsCollector {
    packets_received: AtomicU64,
    fixes_decoded: AtomicU64,
    errors_count: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            packets_received: AtomicU64::new(0),
            fixes_decoded: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
        }
    }

    pub fn record_packet(&self, kind: &str) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        counter!("packets_received", "kind" => kind.to_string()).increment(1);
    }

    pub fn record_fixes(&self, count: usize) {
        self.fixes_decoded.fetch_add(count as u64, Ordering::Relaxed);
        counter!("fixes_decoded").increment(count as u64);
    }

    pub fn record_error(&self, stage: &str, error_type: &str) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
        counter!("errors", "stage" => stage.to_string(), "type" => error_type.to_string()).increment(1);
    }

    pub fn record_connection_open(&self) {
        counter!("connections_opened").increment(1);
        gauge!("connections_active").increment(1.0);
    }

    pub fn record_connection_close(&self) {
        gauge!("connections_active").decrement(1.0);
    }

    pub fn record_sink_latency(&self, latency_ms: f64, sink: &str) {
        histogram!("sink_latency_ms", "sink" => sink.to_string()).record(latency_ms);
    }

    pub fn record_persist(&self, outcome: &str) {
        counter!("rows_persisted", "outcome" => outcome.to_string()).increment(1);
    }

    pub fn record_publish(&self, success: bool) {
        let status = if success { "success" } else { "failure" };
        counter!("events_published", "status" => status.to_string()).increment(1);
    }

    pub fn record_batch_size(&self, size: usize) {
        histogram!("decode_batch_size").record(size as f64);
    }

    pub fn record_http_request(&self, endpoint: &str, status: u16) {
        counter!("http_requests", "endpoint" => endpoint.to_string(), "status" => status.to_string()).increment(1);
    }

    pub fn get_stats(&self) -> (u64, u64, u64) {
        (
            self.packets_received.load(Ordering::Relaxed),
            self.fixes_decoded.load(Ordering::Relaxed),
            self.errors_count.load(Ordering::Relaxed),
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
