// Sink fan-out: per-fix persistence and event publication
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use fleetlink_common::{
    CorrelatedRecord, DecodedFix, FixEvent, MetricsCollector, Result, SessionAnnouncement,
    UploadRef,
};
use tracing::warn;

use crate::media::MediaStore;
use crate::session::camera_id_from_imei;

/// Durable storage for correlated fix rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_fix(&self, record: &CorrelatedRecord) -> Result<()>;
    async fn update_fix(&self, upload_ref: &UploadRef, fix: &DecodedFix) -> Result<()>;
}

/// Event-stream publisher, at-least-once.
#[async_trait]
pub trait FixPublisher: Send + Sync {
    async fn publish(&self, event: &FixEvent) -> Result<()>;
}

/// Forwards each decoded fix to the sinks, strictly sequentially and in
/// packet order.
///
/// Per fix: allocate a media artifact path, persist (update the row keyed
/// by the announced upload ref if one is held, insert otherwise), then
/// publish. Every sink failure is contained to its record: it is logged,
/// counted, and the remaining steps and records still run. A persist
/// failure does not skip the publish attempt.
pub struct SinkGateway {
    store: Arc<dyn RecordStore>,
    publisher: Arc<dyn FixPublisher>,
    media: MediaStore,
    metrics: Arc<MetricsCollector>,
}

impl SinkGateway {
    pub fn new(
        store: Arc<dyn RecordStore>,
        publisher: Arc<dyn FixPublisher>,
        media: MediaStore,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            publisher,
            media,
            metrics,
        }
    }

    pub async fn forward_batch(&self, fixes: &[DecodedFix], announcement: &SessionAnnouncement) {
        let camera_id = camera_id_from_imei(announcement.imei.as_deref());

        for (index, fix) in fixes.iter().enumerate() {
            let start = Instant::now();

            let file_path = match self.media.allocate(index).await {
                Ok(path) => path,
                Err(e) => {
                    warn!("Media allocation failed for record {}: {}", index, e);
                    self.metrics.record_error("media", "allocate");
                    String::new()
                }
            };

            let record = CorrelatedRecord {
                fix: fix.clone(),
                camera_id,
                upload_ref: announcement.upload_ref.clone(),
                file_path,
            };

            let persisted = match &announcement.upload_ref {
                Some(upload_ref) => self.store.update_fix(upload_ref, fix).await,
                None => self.store.insert_fix(&record).await,
            };
            match persisted {
                Ok(()) => {
                    let outcome = if announcement.upload_ref.is_some() {
                        "update"
                    } else {
                        "insert"
                    };
                    self.metrics.record_persist(outcome);
                }
                Err(e) => {
                    warn!("Persist failed for record {}: {}", index, e);
                    self.metrics.record_error("store", "persist");
                }
            }

            let event = FixEvent::from(&record);
            match self.publisher.publish(&event).await {
                Ok(()) => self.metrics.record_publish(true),
                Err(e) => {
                    warn!("Publish failed for record {}: {}", index, e);
                    self.metrics.record_error("publish", "send");
                    self.metrics.record_publish(false);
                }
            }

            self.metrics
                .record_sink_latency(start.elapsed().as_secs_f64() * 1000.0, "record");
        }
    }
}
