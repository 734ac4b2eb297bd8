//! Tier purchase model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use coursegate_core::tier::TierId;
use coursegate_core::types::{DbId, Timestamp};

/// A row from the `tier_purchases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TierPurchase {
    pub id: DbId,
    pub user_id: DbId,
    pub tier_id: TierId,
    pub purchased_at: Timestamp,
    /// Reference from the payment provider, if any.
    pub external_reference: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTierPurchase {
    pub user_id: DbId,
    pub tier_id: TierId,
    pub external_reference: Option<String>,
}
