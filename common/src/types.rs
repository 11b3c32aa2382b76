// Core telemetry data types - JSON-serializable and shared between the
// gateway and the ingest service
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier minted when an upload begins. The gateway sends epoch
/// milliseconds, but the wire accepts either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadRef {
    Number(u64),
    Text(String),
}

impl fmt::Display for UploadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadRef::Number(n) => write!(f, "{}", n),
            UploadRef::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for UploadRef {
    fn from(n: u64) -> Self {
        UploadRef::Number(n)
    }
}

impl From<&str> for UploadRef {
    fn from(s: &str) -> Self {
        UploadRef::Text(s.to_string())
    }
}

/// One decoded GPS/telemetry sample, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFix {
    pub priority: u8,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: i16,
    pub angle: u16,
    pub satellites: u8,
    pub speed: u16,
    pub event_id: u8,
    /// Wall-clock ingestion time. The 8 reserved bytes preceding each
    /// record on the wire are never interpreted as a timestamp.
    pub ingested_at: DateTime<Utc>,
}

/// Partial session update extracted from a single inbound message.
/// Absent fields leave the held announcement unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionHint {
    pub upload_ref: Option<UploadRef>,
    pub imei: Option<String>,
}

impl SessionHint {
    pub fn is_empty(&self) -> bool {
        self.upload_ref.is_none() && self.imei.is_none()
    }
}

/// The current announcement in effect for the process. Fields are merged
/// last-write-wins and never cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionAnnouncement {
    pub upload_ref: Option<UploadRef>,
    pub imei: Option<String>,
}

/// JSON control message sent by the gateway on a fresh TCP connection to
/// announce session metadata and/or carry hex-encoded binary telemetry.
/// Any subset of fields may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    #[serde(rename = "uploadRef", skip_serializing_if = "Option::is_none")]
    pub upload_ref: Option<UploadRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(rename = "avlHex", skip_serializing_if = "Option::is_none")]
    pub avl_hex: Option<String>,
}

impl Handshake {
    pub fn session_hint(&self) -> SessionHint {
        SessionHint {
            upload_ref: self.upload_ref.clone(),
            imei: self.imei.clone(),
        }
    }
}

/// A decoded fix plus the identity attached by the session correlator.
/// The unit handed to the sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedRecord {
    pub fix: DecodedFix,
    pub camera_id: i64,
    pub upload_ref: Option<UploadRef>,
    pub file_path: String,
}

/// GPS sub-object as it appears in persisted rows and published events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsReading {
    pub lat: f64,
    pub lon: f64,
    pub speed: u16,
    pub altitude: i16,
    pub angle: u16,
    pub satellites: u8,
}

impl From<&DecodedFix> for GpsReading {
    fn from(fix: &DecodedFix) -> Self {
        GpsReading {
            lat: fix.latitude,
            lon: fix.longitude,
            speed: fix.speed,
            altitude: fix.altitude,
            angle: fix.angle,
            satellites: fix.satellites,
        }
    }
}

/// JSON event published to the event stream, one per fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixEvent {
    pub camera_id: i64,
    pub timestamp: DateTime<Utc>,
    pub gps: GpsReading,
    pub file_path: String,
}

impl From<&CorrelatedRecord> for FixEvent {
    fn from(record: &CorrelatedRecord) -> Self {
        FixEvent {
            camera_id: record.camera_id,
            timestamp: record.fix.ingested_at,
            gps: GpsReading::from(&record.fix),
            file_path: record.file_path.clone(),
        }
    }
}
