// MySQL persistence for fix rows
use async_trait::async_trait;
use fleetlink_common::{CorrelatedRecord, DecodedFix, Result, UploadRef};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

use crate::sink::RecordStore;

pub struct MySqlRecordStore {
    pool: MySqlPool,
}

impl MySqlRecordStore {
    /// Open a lazy pool. A down database surfaces per query, not at
    /// startup, so ingestion keeps running through an outage.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;
        info!("✅ MySQL pool configured (max 10 connections)");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for MySqlRecordStore {
    async fn insert_fix(&self, record: &CorrelatedRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO camera_files \
             (camera_id, timestamp, file_path, lat, lon, speed, altitude, angle, satellites, upload_ref) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.camera_id)
        .bind(record.fix.ingested_at)
        .bind(&record.file_path)
        .bind(record.fix.latitude)
        .bind(record.fix.longitude)
        .bind(record.fix.speed as i32)
        .bind(record.fix.altitude as i32)
        .bind(record.fix.angle as i32)
        .bind(record.fix.satellites as i32)
        .bind(record.upload_ref.as_ref().map(|r| r.to_string()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_fix(&self, upload_ref: &UploadRef, fix: &DecodedFix) -> Result<()> {
        sqlx::query(
            "UPDATE camera_files \
             SET lat = ?, lon = ?, speed = ?, altitude = ?, angle = ?, satellites = ?, timestamp = ? \
             WHERE upload_ref = ?",
        )
        .bind(fix.latitude)
        .bind(fix.longitude)
        .bind(fix.speed as i32)
        .bind(fix.altitude as i32)
        .bind(fix.angle as i32)
        .bind(fix.satellites as i32)
        .bind(fix.ingested_at)
        .bind(upload_ref.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
