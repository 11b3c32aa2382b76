// Fleetlink ingest service - TCP telemetry listener, session correlation,
// and sink fan-out

pub mod kafka;
pub mod media;
pub mod server;
pub mod session;
pub mod sink;
pub mod storage;

pub use kafka::KafkaFixPublisher;
pub use media::MediaStore;
pub use server::{Framing, IngestServer, PerDeliveryFraming};
pub use session::{camera_id_from_imei, SessionTracker, DEFAULT_CAMERA_ID};
pub use sink::{FixPublisher, RecordStore, SinkGateway};
pub use storage::MySqlRecordStore;
