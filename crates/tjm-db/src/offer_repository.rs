use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

use tjm_core::error::AppError;
use tjm_core::models::OfferRow;
use tjm_core::traits::OfferStore;

/// Offer persistence in the `job_offers` table, keyed on
/// `(source, source_id)`.
#[derive(Clone)]
pub struct OfferRepository {
    pool: Pool<Postgres>,
}

impl OfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one offer by natural key.
    pub async fn get(&self, source: &str, source_id: &str) -> Result<Option<OfferRow>, AppError> {
        let row = sqlx::query_as::<_, JobOfferRow>(
            r#"
            SELECT source, source_id, url, title, description, company,
                   tjm_min, tjm_max, tjm_currency, technologies, seniority_level,
                   location, remote_policy, contract_type, scraped_at, processed_at,
                   quality_score, raw_payload
            FROM job_offers
            WHERE source = $1 AND source_id = $2
            "#,
        )
        .bind(source)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, &format!("{source}:{source_id}")))?;

        Ok(row.map(OfferRow::from))
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_offers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "count"))?;
        Ok(row.0)
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct JobOfferRow {
    source: String,
    source_id: String,
    url: Option<String>,
    title: String,
    description: Option<String>,
    company: Option<String>,
    tjm_min: Option<f64>,
    tjm_max: Option<f64>,
    tjm_currency: String,
    technologies: Vec<String>,
    seniority_level: String,
    location: Option<String>,
    remote_policy: String,
    contract_type: String,
    scraped_at: Option<DateTime<Utc>>,
    processed_at: DateTime<Utc>,
    quality_score: f64,
    raw_payload: serde_json::Value,
}

impl From<JobOfferRow> for OfferRow {
    fn from(row: JobOfferRow) -> Self {
        OfferRow {
            source: row.source,
            source_id: row.source_id,
            url: row.url,
            title: row.title,
            description: row.description,
            company: row.company,
            tjm_min: row.tjm_min,
            tjm_max: row.tjm_max,
            tjm_currency: row.tjm_currency,
            technologies: row.technologies,
            seniority_level: row.seniority_level,
            location: row.location,
            remote_policy: row.remote_policy,
            contract_type: row.contract_type,
            scraped_at: row.scraped_at,
            processed_at: row.processed_at,
            quality_score: row.quality_score,
            raw_payload: row.raw_payload,
        }
    }
}

/// Sort sqlx failures into the pipeline's error kinds. Unique violations
/// become `DuplicateKey` so the sink can fall back to an update;
/// connection-level failures become retryable network errors.
fn map_sqlx_error(e: sqlx::Error, key: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateKey(key.to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::NetworkError(e.to_string())
        }
        _ => AppError::DatabaseError(e.to_string()),
    }
}

impl OfferStore for OfferRepository {
    async fn insert(&self, row: &OfferRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO job_offers (
                source, source_id, url, title, description, company,
                tjm_min, tjm_max, tjm_currency, technologies, seniority_level,
                location, remote_policy, contract_type, scraped_at, processed_at,
                quality_score, raw_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(&row.source)
        .bind(&row.source_id)
        .bind(&row.url)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.company)
        .bind(row.tjm_min)
        .bind(row.tjm_max)
        .bind(&row.tjm_currency)
        .bind(&row.technologies)
        .bind(&row.seniority_level)
        .bind(&row.location)
        .bind(&row.remote_policy)
        .bind(&row.contract_type)
        .bind(row.scraped_at)
        .bind(row.processed_at)
        .bind(row.quality_score)
        .bind(&row.raw_payload)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, &row.natural_key()))?;

        Ok(())
    }

    async fn update_by_key(&self, row: &OfferRow) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE job_offers
            SET url = $3, title = $4, description = $5, company = $6,
                tjm_min = $7, tjm_max = $8, tjm_currency = $9, technologies = $10,
                seniority_level = $11, location = $12, remote_policy = $13,
                contract_type = $14, scraped_at = $15, processed_at = $16,
                quality_score = $17, raw_payload = $18, updated_at = NOW()
            WHERE source = $1 AND source_id = $2
            "#,
        )
        .bind(&row.source)
        .bind(&row.source_id)
        .bind(&row.url)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.company)
        .bind(row.tjm_min)
        .bind(row.tjm_max)
        .bind(&row.tjm_currency)
        .bind(&row.technologies)
        .bind(&row.seniority_level)
        .bind(&row.location)
        .bind(&row.remote_policy)
        .bind(&row.contract_type)
        .bind(row.scraped_at)
        .bind(row.processed_at)
        .bind(row.quality_score)
        .bind(&row.raw_payload)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, &row.natural_key()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::DatabaseError(format!(
                "no offer to update for {}",
                row.natural_key()
            )));
        }
        tracing::debug!(key = %row.natural_key(), "Offer updated");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "health check"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_failures_are_retryable() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut, "x:1");
        assert!(matches!(err, AppError::NetworkError(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_failures_are_database_errors() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound, "x:1");
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(!err.is_duplicate_key());
    }
}
