//! Replay-nonce repository: the shared store behind the nonce guard.
//!
//! A live row means "already consumed". The check-and-set is one atomic
//! statement so that concurrent submissions carrying the same nonce can
//! never both observe acceptance within the TTL window.

use sqlx::PgPool;

/// Repository for the replay_nonces table.
#[derive(Clone)]
pub struct NonceRepository {
    pool: PgPool,
}

impl NonceRepository {
    /// Creates a new NonceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically consume a nonce fingerprint.
    ///
    /// Returns true iff this call recorded the nonce: either no row existed,
    /// or the existing row had already expired and was reclaimed in place.
    /// Returns false when a live row exists (replay).
    pub async fn try_consume(
        &self,
        nonce_hash: &str,
        device_id: i64,
        ttl_secs: u64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO replay_nonces (nonce_hash, device_id, expires_at)
            VALUES ($1, $2, NOW() + make_interval(secs => $3))
            ON CONFLICT (nonce_hash) DO UPDATE SET
                device_id = EXCLUDED.device_id,
                expires_at = EXCLUDED.expires_at
            WHERE replay_nonces.expires_at <= NOW()
            "#,
        )
        .bind(nonce_hash)
        .bind(device_id)
        .bind(ttl_secs as f64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete expired nonce rows. Returns the number of deleted records.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM replay_nonces
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
