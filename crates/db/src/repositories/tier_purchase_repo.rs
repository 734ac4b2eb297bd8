//! Repository for the `tier_purchases` table.

use sqlx::PgPool;
use coursegate_core::types::DbId;

use crate::models::tier_purchase::{CreateTierPurchase, TierPurchase};

const COLUMNS: &str =
    "id, user_id, tier_id, purchased_at, external_reference, created_at, updated_at";

pub struct TierPurchaseRepo;

impl TierPurchaseRepo {
    /// Record a purchase. The billing flow that calls this lives outside this service.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTierPurchase,
    ) -> Result<TierPurchase, sqlx::Error> {
        let query = format!(
            "INSERT INTO tier_purchases (user_id, tier_id, external_reference)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TierPurchase>(&query)
            .bind(input.user_id)
            .bind(input.tier_id)
            .bind(&input.external_reference)
            .fetch_one(pool)
            .await
    }

    /// All purchases held by a user, oldest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<TierPurchase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tier_purchases
             WHERE user_id = $1
             ORDER BY purchased_at ASC, id ASC"
        );
        sqlx::query_as::<_, TierPurchase>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
