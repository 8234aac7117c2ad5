//! Database schema management for `airquality-sensorflow`.
//!
//! Ensures the measurement table and its time index exist before serving
//! requests. Applied once on startup when the Postgres store is selected.

use sqlx::PgPool;

use crate::error::StoreError;

// ---

/// Create the schema (idempotent).
///
/// One `air_quality` row per measurement. `id` only preserves source order
/// among equal timestamps; there is no natural key.
pub async fn create_schema(pool: &PgPool) -> Result<(), StoreError> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS air_quality (
            id            BIGSERIAL        PRIMARY KEY,
            timestamp     TIMESTAMPTZ      NOT NULL,
            co_gt         DOUBLE PRECISION NOT NULL,
            pt08_s1_co    INTEGER          NOT NULL,
            nmhc_gt       INTEGER          NOT NULL,
            c6h6_gt       DOUBLE PRECISION NOT NULL,
            pt08_s2_nmhc  INTEGER          NOT NULL,
            nox_gt        INTEGER          NOT NULL,
            pt08_s3_nox   INTEGER          NOT NULL,
            no2_gt        INTEGER          NOT NULL,
            pt08_s4_no2   INTEGER          NOT NULL,
            pt08_s5_o3    INTEGER          NOT NULL,
            t             DOUBLE PRECISION NOT NULL,
            rh            DOUBLE PRECISION NOT NULL,
            ah            DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Range scans and the ordered listing both walk this index
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_air_quality_timestamp
            ON air_quality (timestamp, id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
