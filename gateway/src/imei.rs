// Redis-backed IMEI validity cache
use async_trait::async_trait;
use fleetlink_common::Result;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use tracing::{info, warn};

/// The ten example fleet units provisioned on startup.
const EXAMPLE_FLEET: [&str; 10] = [
    "123456789012345",
    "987654321098765",
    "111111111111111",
    "222222222222222",
    "333333333333333",
    "444444444444444",
    "555555555555555",
    "666666666666666",
    "777777777777777",
    "888888888888888",
];

/// Device-identifier lookup seam. The handlers consume this trait so
/// tests can substitute an in-memory fake for the Redis cache.
#[async_trait]
pub trait ImeiValidator: Send + Sync {
    /// True when the identifier belongs to a provisioned unit.
    async fn validate(&self, imei: &str) -> bool;
    /// Backing-store liveness probe for health reporting.
    async fn ping(&self) -> bool;
}

pub struct ImeiCache {
    connection: MultiplexedConnection,
}

impl ImeiCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        Ok(Self { connection })
    }

    fn key(imei: &str) -> String {
        format!("imei:{}", imei)
    }

    pub async fn add(&self, imei: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.set(Self::key(imei), "valid").await?;
        Ok(())
    }

    /// Provision the example fleet identifiers.
    pub async fn seed_examples(&self) -> Result<()> {
        for imei in EXAMPLE_FLEET {
            self.add(imei).await?;
        }
        info!("Seeded {} example fleet identifiers", EXAMPLE_FLEET.len());
        Ok(())
    }
}

#[async_trait]
impl ImeiValidator for ImeiCache {
    /// A lookup failure counts as unknown.
    async fn validate(&self, imei: &str) -> bool {
        let mut conn = self.connection.clone();
        match conn.get::<String, Option<String>>(Self::key(imei)).await {
            Ok(value) => value.as_deref() == Some("valid"),
            Err(e) => {
                warn!("IMEI lookup failed for {}: {}", imei, e);
                false
            }
        }
    }

    async fn ping(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}
