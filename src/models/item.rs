use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ITEM_ICON_BASE;

// ---------------------------------------------------------------------------
// MarketItem: One tradable item as stored remotely
// ---------------------------------------------------------------------------

/// A market listing summary. The store assigns `id`; price fields are absent
/// for items without trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub rarity: u8,
    pub category: String,
    pub subcategory: String,
    pub image: String,
    #[serde(default)]
    pub avg_price: Option<f64>,
    #[serde(default)]
    pub cheapest_remaining: Option<f64>,
    #[serde(default)]
    pub low_price: Option<f64>,
    #[serde(default)]
    pub recent_price: Option<f64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MarketItem {
    /// Path of the item's icon asset.
    pub fn image_url(&self) -> String {
        format!("{}/{}", ITEM_ICON_BASE, self.image)
    }
}

// ---------------------------------------------------------------------------
// FavoriteItem: Locally persisted favorite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub name: String,
    pub rarity: u8,
}
