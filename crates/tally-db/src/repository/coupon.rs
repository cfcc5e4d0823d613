//! # Coupon Repository
//!
//! Coupon definitions and the usage counter.
//!
//! Codes are stored uppercase; lookups expect an already normalized code.
//! The usage increment re-checks the limit in its WHERE clause, so two
//! sales racing for the last use cannot both count.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::coupon::validate_definition;
use tally_core::validation::normalize_coupon_code;
use tally_core::Coupon;

const COUPON_COLUMNS_SQL: &str = r#"
    SELECT code, discount_kind, discount_value, min_purchase_cents, max_discount_cents,
           expiration_date, usage_limit, usage_count, is_active, created_at
    FROM coupons
"#;

// =============================================================================
// Shared statements (pool or transaction)
// =============================================================================

pub(crate) async fn fetch_coupon(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<Coupon>> {
    let sql = format!("{COUPON_COLUMNS_SQL} WHERE code = ?1");
    let coupon = sqlx::query_as::<_, Coupon>(&sql)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(coupon)
}

/// Adds one use. Returns `false` if the coupon is missing, inactive or
/// already at its limit.
pub(crate) async fn increment_usage(conn: &mut SqliteConnection, code: &str) -> DbResult<bool> {
    debug!(code = %code, "Incrementing coupon usage");

    let result = sqlx::query(
        r#"
        UPDATE coupons
        SET usage_count = usage_count + 1
        WHERE code = ?1
          AND is_active = 1
          AND (usage_limit = 0 OR usage_count < usage_limit)
        "#,
    )
    .bind(code)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon administration.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Gets a coupon by code (case-insensitive).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        fetch_coupon(&mut conn, &code.trim().to_uppercase()).await
    }

    /// Inserts a coupon definition. The code is stored uppercase.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        validate_definition(coupon).map_err(|e| DbError::InvalidData(e.to_string()))?;
        let code = normalize_coupon_code(Some(&coupon.code))
            .map_err(|e| DbError::InvalidData(e.to_string()))?
            .ok_or_else(|| DbError::InvalidData("code is required".to_string()))?;

        debug!(code = %code, kind = coupon.discount_kind.as_str(), "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons
                (code, discount_kind, discount_value, min_purchase_cents, max_discount_cents,
                 expiration_date, usage_limit, usage_count, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&code)
        .bind(coupon.discount_kind)
        .bind(coupon.discount_value)
        .bind(coupon.min_purchase_cents)
        .bind(coupon.max_discount_cents)
        .bind(coupon.expiration_date)
        .bind(coupon.usage_limit)
        .bind(coupon.usage_count)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, code.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Coupons that would pass the active / expiry / limit checks on
    /// `today`.
    pub async fn list_active(&self, today: NaiveDate) -> DbResult<Vec<Coupon>> {
        let sql = format!(
            "{COUPON_COLUMNS_SQL} WHERE is_active = 1 \
             AND (expiration_date IS NULL OR expiration_date >= ?1) \
             AND (usage_limit = 0 OR usage_count < usage_limit) \
             ORDER BY code"
        );
        let coupons = sqlx::query_as::<_, Coupon>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        Ok(coupons)
    }

    /// Turns a coupon off. Past sales keep their recorded discount.
    pub async fn deactivate(&self, code: &str) -> DbResult<()> {
        let code = code.trim().to_uppercase();
        debug!(code = %code, "Deactivating coupon");

        let result = sqlx::query("UPDATE coupons SET is_active = 0 WHERE code = ?1")
            .bind(&code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", code));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
