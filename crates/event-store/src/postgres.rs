use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventEnvelope, EventId, EventStoreError, Result, Snapshot, TripId, Version,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

/// PostgreSQL-backed event store implementation.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_event(row: &PgRow) -> Result<EventEnvelope> {
        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            trip_id: TripId::from_uuid(row.try_get::<Uuid, _>("trip_id")?),
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get("timestamp")?,
            schema_version: row.try_get::<i32, _>("schema_version")? as u16,
            payload: row.try_get("payload")?,
        })
    }

    fn row_to_snapshot(row: &PgRow) -> Result<Snapshot> {
        Ok(Snapshot {
            trip_id: TripId::from_uuid(row.try_get::<Uuid, _>("trip_id")?),
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get("timestamp")?,
            schema_version: row.try_get::<i32, _>("schema_version")? as u16,
            state: row.try_get("state")?,
        })
    }

    async fn current_version(
        tx: &mut sqlx::PgConnection,
        trip_id: TripId,
    ) -> Result<Version> {
        // GREATEST ignores NULLs, so a fully compacted log still reports
        // the latest snapshot's position.
        let version: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT GREATEST(
                (SELECT MAX(version) FROM events WHERE trip_id = $1),
                (SELECT MAX(version) FROM snapshots WHERE trip_id = $1)
            )
            "#,
        )
        .bind(trip_id.as_uuid())
        .fetch_one(tx)
        .await?;

        Ok(Version::new(version.unwrap_or(0)))
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let trip_id = events[0].trip_id;

        let mut tx = self.pool.begin().await?;

        if let Some(expected) = options.expected_version {
            let actual = Self::current_version(&mut tx, trip_id).await?;
            if actual != expected {
                return Err(EventStoreError::ConcurrencyConflict {
                    trip_id,
                    expected,
                    actual,
                });
            }
        }

        let mut last_version = Version::initial();
        for event in &events {
            sqlx::query(
                r#"
                INSERT INTO events (id, event_type, trip_id, version, timestamp, schema_version, payload)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(&event.event_type)
            .bind(event.trip_id.as_uuid())
            .bind(event.version.as_i64())
            .bind(event.timestamp)
            .bind(i32::from(event.schema_version))
            .bind(&event.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // Unique constraint violation means a concurrent writer won
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_trip_version")
                {
                    return EventStoreError::ConcurrencyConflict {
                        trip_id,
                        expected: options.expected_version.unwrap_or_else(Version::initial),
                        actual: event.version,
                    };
                }
                EventStoreError::Database(e)
            })?;

            last_version = event.version;
        }

        tx.commit().await?;
        Ok(last_version)
    }

    async fn events_for_trip(&self, trip_id: TripId) -> Result<Vec<EventEnvelope>> {
        self.events_for_trip_from(trip_id, Version::first()).await
    }

    async fn events_for_trip_from(
        &self,
        trip_id: TripId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_type, trip_id, version, timestamp, schema_version, payload
            FROM events
            WHERE trip_id = $1 AND version >= $2
            ORDER BY version ASC
            "#,
        )
        .bind(trip_id.as_uuid())
        .bind(from_version.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_event).collect()
    }

    async fn trip_version(&self, trip_id: TripId) -> Result<Option<Version>> {
        let mut conn = self.pool.acquire().await?;
        let version = Self::current_version(&mut conn, trip_id).await?;
        Ok((version != Version::initial()).then_some(version))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let trip_id = snapshot.trip_id;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (trip_id, version, timestamp, schema_version, state)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (trip_id, version) DO UPDATE
                SET timestamp = EXCLUDED.timestamp,
                    schema_version = EXCLUDED.schema_version,
                    state = EXCLUDED.state
            "#,
        )
        .bind(trip_id.as_uuid())
        .bind(snapshot.version.as_i64())
        .bind(snapshot.timestamp)
        .bind(i32::from(snapshot.schema_version))
        .bind(&snapshot.state)
        .execute(&mut *tx)
        .await?;

        // Retention window: keep the two most recent snapshots.
        sqlx::query(
            r#"
            DELETE FROM snapshots
            WHERE trip_id = $1 AND version NOT IN (
                SELECT version FROM snapshots
                WHERE trip_id = $1
                ORDER BY version DESC
                LIMIT $2
            )
            "#,
        )
        .bind(trip_id.as_uuid())
        .bind(crate::RETAINED_SNAPSHOTS as i64)
        .execute(&mut *tx)
        .await?;

        // Compaction: events covered by the oldest retained snapshot.
        sqlx::query(
            r#"
            DELETE FROM events
            WHERE trip_id = $1 AND version <= (
                SELECT MIN(version) FROM snapshots WHERE trip_id = $1
            )
            "#,
        )
        .bind(trip_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn latest_snapshot(&self, trip_id: TripId) -> Result<Option<Snapshot>> {
        let row = sqlx::query(
            r#"
            SELECT trip_id, version, timestamp, schema_version, state
            FROM snapshots
            WHERE trip_id = $1
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(trip_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_snapshot).transpose()
    }
}
