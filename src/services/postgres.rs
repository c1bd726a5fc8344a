use crate::models::{OfferProfile, TrialMatch, UsSite};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result of a match upsert
///
/// `inserted` distinguishes a newly created (offer_id, nct_id) row from a
/// re-score of an existing one; alerts only fire for the former.
#[derive(Debug, Clone, Copy)]
pub struct UpsertedMatch {
    pub id: Uuid,
    pub inserted: bool,
}

/// PostgreSQL client for the offer and match stores
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Fetch one offer's eligibility profile
    pub async fn get_offer(&self, offer_id: &str) -> Result<OfferProfile, PostgresError> {
        let query = r#"
            SELECT id, condition_name, condition_keywords, min_age, max_age,
                   gender, qualifications, exclusions
            FROM offers
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(offer_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Offer {} not found", offer_id)))?;

        Ok(offer_from_row(&row))
    }

    /// Fetch every active offer, for batch matching runs
    pub async fn list_active_offers(&self) -> Result<Vec<OfferProfile>, PostgresError> {
        let query = r#"
            SELECT id, condition_name, condition_keywords, min_age, max_age,
                   gender, qualifications, exclusions
            FROM offers
            WHERE is_active
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(offer_from_row).collect())
    }

    /// Upsert a match row keyed by (offer_id, nct_id)
    ///
    /// A re-score refreshes the score, reason and location summary but
    /// leaves is_verified and match_type untouched.
    pub async fn upsert_match(
        &self,
        offer_id: &str,
        nct_id: &str,
        score: i32,
        reason: &str,
        location_count: i32,
        states: &[String],
    ) -> Result<UpsertedMatch, PostgresError> {
        let query = r#"
            INSERT INTO trial_matches
                (offer_id, nct_id, score, reason, location_count, states,
                 is_verified, match_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, 'auto', NOW(), NOW())
            ON CONFLICT (offer_id, nct_id)
            DO UPDATE SET
                score = EXCLUDED.score,
                reason = EXCLUDED.reason,
                location_count = EXCLUDED.location_count,
                states = EXCLUDED.states,
                updated_at = NOW()
            RETURNING id, (xmax = 0) AS inserted
        "#;

        let row = sqlx::query(query)
            .bind(offer_id)
            .bind(nct_id)
            .bind(score)
            .bind(reason)
            .bind(location_count)
            .bind(states)
            .fetch_one(&self.pool)
            .await?;

        let result = UpsertedMatch {
            id: row.get("id"),
            inserted: row.get("inserted"),
        };

        tracing::debug!(
            "Upserted match {} -> {} (score {}, {})",
            offer_id,
            nct_id,
            score,
            if result.inserted { "created" } else { "updated" }
        );

        Ok(result)
    }

    /// Replace the stored US locations for a match
    pub async fn replace_locations(
        &self,
        match_id: Uuid,
        sites: &[UsSite],
    ) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM trial_locations WHERE match_id = $1")
            .bind(match_id)
            .execute(&mut *tx)
            .await?;

        for site in sites {
            sqlx::query(
                r#"
                INSERT INTO trial_locations (match_id, facility, city, state, zip, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(match_id)
            .bind(&site.facility)
            .bind(&site.city)
            .bind(&site.state)
            .bind(&site.zip)
            .bind(&site.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Record a high-score match alert
    pub async fn record_alert(
        &self,
        offer_id: &str,
        nct_id: &str,
        score: i32,
    ) -> Result<(), PostgresError> {
        sqlx::query(
            r#"
            INSERT INTO match_alerts (offer_id, nct_id, score, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(offer_id)
        .bind(nct_id)
        .bind(score)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "High-score match alert: offer {} / {} scored {}",
            offer_id,
            nct_id,
            score
        );

        Ok(())
    }

    /// Fetch persisted matches for an offer, best score first
    pub async fn matches_for_offer(
        &self,
        offer_id: &str,
    ) -> Result<Vec<TrialMatch>, PostgresError> {
        let query = r#"
            SELECT id, offer_id, nct_id, score, reason, location_count, states,
                   is_verified, match_type, created_at, updated_at
            FROM trial_matches
            WHERE offer_id = $1
            ORDER BY score DESC, nct_id
        "#;

        let rows = sqlx::query(query)
            .bind(offer_id)
            .fetch_all(&self.pool)
            .await?;

        let matches = rows
            .iter()
            .map(|row| TrialMatch {
                id: row.get("id"),
                offer_id: row.get("offer_id"),
                nct_id: row.get("nct_id"),
                score: row.get("score"),
                reason: row.get("reason"),
                location_count: row.get("location_count"),
                states: row
                    .get::<Option<Vec<String>>, _>("states")
                    .unwrap_or_default(),
                is_verified: row.get("is_verified"),
                match_type: row.get("match_type"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect();

        Ok(matches)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn offer_from_row(row: &sqlx::postgres::PgRow) -> OfferProfile {
    OfferProfile {
        id: row.get("id"),
        condition_name: row.get("condition_name"),
        condition_keywords: row
            .get::<Option<Vec<String>>, _>("condition_keywords")
            .unwrap_or_default(),
        min_age: row.get("min_age"),
        max_age: row.get("max_age"),
        gender: row.get("gender"),
        qualifications: row.get("qualifications"),
        exclusions: row
            .get::<Option<Vec<String>>, _>("exclusions")
            .unwrap_or_default(),
    }
}
