use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Availability, Booking, PostId, Result, TicketError, UserId,
    store::TicketStore,
};

/// PostgreSQL-backed ticket store implementation.
///
/// Reservation runs inside a transaction that takes a row-level lock on the
/// post (`SELECT ... FOR UPDATE`), so the capacity check and the booking
/// insert commit as one unit and concurrent reservations for the same post
/// serialize on the lock. The `(user_id, post_id)` unique constraint backs
/// up the duplicate check at the schema level.
#[derive(Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    /// Creates a new PostgreSQL ticket store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        Ok(Booking {
            post_id: PostId::from_uuid(row.try_get::<Uuid, _>("post_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    /// Loads a booking record, if one exists.
    pub async fn get_booking(&self, user_id: UserId, post_id: PostId) -> Result<Option<Booking>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT post_id, user_id, created_at FROM bookings WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(post_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_booking).transpose()
    }
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn reserve(&self, user_id: UserId, post_id: PostId) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;

        // Lock the post row; reservations for the same post serialize here.
        let limit: Option<i32> =
            sqlx::query_scalar("SELECT tickets_limit FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let Some(limit) = limit else {
            return Err(TicketError::PostNotFound(post_id));
        };
        let limit = limit.max(0) as u32;

        let already_booked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(post_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        if already_booked {
            return Err(TicketError::AlreadyBooked { user_id, post_id });
        }

        let booked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE post_id = $1")
            .bind(post_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        if booked >= limit as i64 {
            return Err(TicketError::SoldOut { post_id, limit });
        }

        let booking = Booking::new(user_id, post_id);
        sqlx::query("INSERT INTO bookings (post_id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(booking.post_id.as_uuid())
            .bind(booking.user_id.as_uuid())
            .bind(booking.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // The unique constraint backs up the existence check above
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_user_post_booking")
                {
                    return TicketError::AlreadyBooked { user_id, post_id };
                }
                TicketError::Database(e)
            })?;

        tx.commit().await?;
        Ok(booking)
    }

    async fn cancel(&self, user_id: UserId, post_id: PostId) -> Result<()> {
        // Single conditional delete; atomic on its own.
        let result = sqlx::query("DELETE FROM bookings WHERE user_id = $1 AND post_id = $2")
            .bind(user_id.as_uuid())
            .bind(post_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TicketError::NotBooked { user_id, post_id });
        }
        Ok(())
    }

    async fn tickets_limit(&self, post_id: PostId) -> Result<Option<u32>> {
        let limit: Option<i32> =
            sqlx::query_scalar("SELECT tickets_limit FROM posts WHERE id = $1")
                .bind(post_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(limit.map(|l| l.max(0) as u32))
    }

    async fn booked_count(&self, post_id: PostId) -> Result<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE post_id = $1")
            .bind(post_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u32)
    }

    async fn has_booking(&self, user_id: UserId, post_id: PostId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(post_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn availability(&self, post_id: PostId) -> Result<Availability> {
        // One query so limit and count come from the same snapshot
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT p.tickets_limit, COUNT(b.user_id) AS booked
            FROM posts p
            LEFT JOIN bookings b ON b.post_id = p.id
            WHERE p.id = $1
            GROUP BY p.id, p.tickets_limit
            "#,
        )
        .bind(post_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(TicketError::PostNotFound(post_id));
        };

        let limit: i32 = row.try_get("tickets_limit")?;
        let booked: i64 = row.try_get("booked")?;
        Ok(Availability::new(limit.max(0) as u32, booked.max(0) as u32))
    }

    async fn availability_of_many(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Availability>> {
        let ids: Vec<Uuid> = post_ids.iter().map(|id| id.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.tickets_limit, COUNT(b.user_id) AS booked
            FROM posts p
            LEFT JOIN bookings b ON b.post_id = p.id
            WHERE p.id = ANY($1)
            GROUP BY p.id, p.tickets_limit
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshots = HashMap::with_capacity(rows.len());
        for row in rows {
            let post_id = PostId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let limit: i32 = row.try_get("tickets_limit")?;
            let booked: i64 = row.try_get("booked")?;
            snapshots.insert(
                post_id,
                Availability::new(limit.max(0) as u32, booked.max(0) as u32),
            );
        }
        Ok(snapshots)
    }

    async fn user_tickets(&self, user_id: UserId) -> Result<Vec<PostId>> {
        let rows = sqlx::query("SELECT post_id FROM bookings WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok(PostId::from_uuid(row.try_get::<Uuid, _>("post_id")?)))
            .collect()
    }
}
