// Session correlation state shared across connections
use fleetlink_common::{SessionAnnouncement, SessionHint};
use tokio::sync::RwLock;

/// Fallback camera id when no usable device identifier is held.
pub const DEFAULT_CAMERA_ID: i64 = 12345;

/// Holder of the process-wide session announcement.
///
/// Exactly one announcement exists at a time: whichever connection last
/// announced wins, field by field, and a field once set is never cleared.
/// The whole announcement sits behind one lock, so a reader never observes
/// a half-applied update. Two uploads in flight at once will interleave
/// their announcements; that cross-connection race is inherited wire
/// behavior and callers must not assume per-connection isolation.
pub struct SessionTracker {
    current: RwLock<SessionAnnouncement>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(SessionAnnouncement::default()),
        }
    }

    /// Merge the hint's present fields into the announcement.
    pub async fn apply(&self, hint: &SessionHint) {
        if hint.is_empty() {
            return;
        }
        let mut current = self.current.write().await;
        if let Some(upload_ref) = &hint.upload_ref {
            current.upload_ref = Some(upload_ref.clone());
        }
        if let Some(imei) = &hint.imei {
            current.imei = Some(imei.clone());
        }
    }

    /// Snapshot the announcement in effect right now.
    pub async fn current(&self) -> SessionAnnouncement {
        self.current.read().await.clone()
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the numeric camera id from the held device identifier: strip
/// every non-digit character and parse the remainder. A missing
/// identifier, an all-symbol identifier, or a digit string too long for
/// i64 falls back to [`DEFAULT_CAMERA_ID`].
pub fn camera_id_from_imei(imei: Option<&str>) -> i64 {
    match imei {
        Some(imei) => {
            let digits: String = imei.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<i64>().unwrap_or(DEFAULT_CAMERA_ID)
        }
        None => DEFAULT_CAMERA_ID,
    }
}
