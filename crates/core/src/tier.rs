//! Course tiers and the entitlement hierarchy.
//!
//! Tiers are strictly ordered. Owning a higher tier entitles a learner to
//! every course of the same or a lower tier, so a learner's effective
//! entitlement is simply the highest tier among their purchases.

use serde::{Deserialize, Serialize};

/// Tier id type matching the SMALLINT `tiers` lookup table.
pub type TierId = i16;

/// One of the three purchasable entitlement levels, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "TIER_1")]
    Tier1,
    #[serde(rename = "TIER_2")]
    Tier2,
    #[serde(rename = "TIER_3")]
    Tier3,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 3] = [Tier::Tier1, Tier::Tier2, Tier::Tier3];

    /// Numeric level (1..=3). Also the id of the row in the `tiers` table.
    pub fn level(self) -> TierId {
        match self {
            Tier::Tier1 => 1,
            Tier::Tier2 => 2,
            Tier::Tier3 => 3,
        }
    }

    /// Resolve a tier from its lookup-table id.
    pub fn from_level(level: TierId) -> Option<Self> {
        match level {
            1 => Some(Tier::Tier1),
            2 => Some(Tier::Tier2),
            3 => Some(Tier::Tier3),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Tier1 => "TIER_1",
            Tier::Tier2 => "TIER_2",
            Tier::Tier3 => "TIER_3",
        }
    }

    /// Whether owning `self` entitles access to content requiring `required`.
    pub fn grants(self, required: Tier) -> bool {
        self.level() >= required.level()
    }

    /// Effective entitlement across any number of purchases.
    ///
    /// Returns `None` when nothing was purchased.
    pub fn highest<I>(owned: I) -> Option<Tier>
    where
        I: IntoIterator<Item = Tier>,
    {
        owned.into_iter().max()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
