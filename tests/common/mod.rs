//! Shared fixtures for the market view integration tests.
//!
//! `setup_sample_store()` loads a handful of items across two regions into
//! an in-memory DuckDB store through an NDJSON temp file. `GatedStore`
//! hands each query to the test and waits for the test to answer it, so
//! tests control the order in which fetches settle.

#![allow(dead_code)]

use std::io::Write;

use market_view::{DuckDbStore, MarketError, MarketItem, MarketPage, MarketQuery, MarketStore, Result};
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, oneshot};

pub const REGION: &str = "North America East";
pub const OTHER_REGION: &str = "Europe West";

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Create a DuckDB store holding the sample market rows.
pub fn setup_sample_store() -> DuckDbStore {
    let store = DuckDbStore::open_in_memory().unwrap();
    let rows = vec![
        serde_json::json!({
            "id": "na-honor-leapstone",
            "region": REGION,
            "name": "Honor Leapstone",
            "amount": 1,
            "rarity": 2,
            "category": "Enhancement Material",
            "subcategory": "Honing Materials",
            "image": "honor-leapstone.webp",
            "avgPrice": 4.2,
            "cheapestRemaining": 1200,
            "lowPrice": 4.0,
            "recentPrice": 4.0,
            "updatedAt": "2022-03-01T10:00:00Z"
        }),
        serde_json::json!({
            "id": "na-solar-grace",
            "region": REGION,
            "name": "Solar Grace",
            "amount": 1,
            "rarity": 2,
            "category": "Enhancement Material",
            "subcategory": "Additional Honing Materials",
            "image": "solar-grace.webp",
            "avgPrice": 12.5,
            "cheapestRemaining": 300,
            "lowPrice": 12.0,
            "recentPrice": 13.0,
            "updatedAt": "2022-03-01T11:00:00Z"
        }),
        serde_json::json!({
            "id": "na-solar-blessing",
            "region": REGION,
            "name": "Solar Blessing",
            "amount": 1,
            "rarity": 3,
            "category": "Enhancement Material",
            "subcategory": "Additional Honing Materials",
            "image": "solar-blessing.webp",
            "avgPrice": 30.0,
            "cheapestRemaining": 80,
            "lowPrice": 29.0,
            "recentPrice": 31.0,
            "updatedAt": "2022-03-01T09:00:00Z"
        }),
        serde_json::json!({
            "id": "na-oreha-fusion",
            "region": REGION,
            "name": "Basic Oreha Fusion Material",
            "amount": 1,
            "rarity": 2,
            "category": "Enhancement Material",
            "subcategory": "Other Materials",
            "image": "oreha-fusion.webp",
            "avgPrice": 9.0,
            "cheapestRemaining": 500,
            "lowPrice": 8.5,
            "recentPrice": 9.0,
            "updatedAt": "2022-03-01T08:00:00Z"
        }),
        serde_json::json!({
            "id": "na-heavy-iron-ore",
            "region": REGION,
            "name": "Heavy Iron Ore",
            "amount": 100,
            "rarity": 1,
            "category": "Trader",
            "subcategory": "Mining Loot",
            "image": "heavy-iron-ore.webp",
            "avgPrice": 2.0,
            "cheapestRemaining": 4000,
            "lowPrice": 2.0,
            "recentPrice": 2.0,
            "updatedAt": "2022-03-01T07:00:00Z"
        }),
        serde_json::json!({
            "id": "na-iron-ore",
            "region": REGION,
            "name": "Iron Ore",
            "amount": 100,
            "rarity": 0,
            "category": "Trader",
            "subcategory": "Mining Loot",
            "image": "iron-ore.webp"
        }),
        serde_json::json!({
            "id": "na-hp-potion",
            "region": REGION,
            "name": "HP Potion",
            "amount": 1,
            "rarity": 1,
            "category": "Combat Supplies",
            "subcategory": "Battle Item - Recovery",
            "image": "hp-potion.webp",
            "avgPrice": 5.0,
            "lowPrice": 5.0,
            "recentPrice": 5.0,
            "updatedAt": "2022-03-01T06:00:00Z"
        }),
        serde_json::json!({
            "id": "euw-solar-grace",
            "region": OTHER_REGION,
            "name": "Solar Grace",
            "amount": 1,
            "rarity": 2,
            "category": "Enhancement Material",
            "subcategory": "Additional Honing Materials",
            "image": "solar-grace.webp",
            "avgPrice": 20.0,
            "lowPrice": 19.0,
            "recentPrice": 21.0,
            "updatedAt": "2022-03-01T12:00:00Z"
        }),
    ];

    let mut file = NamedTempFile::new().unwrap();
    for row in &rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();
    let loaded = store.load_ndjson(file.path().to_str().unwrap()).unwrap();
    assert_eq!(loaded, rows.len());
    store
}

/// A bare item for hand-built pages.
pub fn item(id: &str, name: &str) -> MarketItem {
    MarketItem {
        id: id.to_string(),
        name: name.to_string(),
        amount: 1.0,
        rarity: 1,
        category: "Trader".to_string(),
        subcategory: "Other".to_string(),
        image: format!("{id}.webp"),
        avg_price: None,
        cheapest_remaining: None,
        low_price: None,
        recent_price: None,
        updated_at: None,
    }
}

pub fn page(names: &[&str]) -> MarketPage {
    MarketPage {
        items: names.iter().map(|n| item(&n.to_lowercase(), n)).collect(),
        has_more: false,
    }
}

// ---------------------------------------------------------------------------
// GatedStore
// ---------------------------------------------------------------------------

/// A query waiting for the test to answer it.
pub struct PendingQuery {
    pub query: MarketQuery,
    reply: oneshot::Sender<Result<MarketPage>>,
}

impl PendingQuery {
    pub fn respond(self, result: Result<MarketPage>) {
        let _ = self.reply.send(result);
    }
}

pub struct GatedStore {
    requests: mpsc::UnboundedSender<PendingQuery>,
}

impl GatedStore {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingQuery>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Self { requests }, rx)
    }
}

impl MarketStore for GatedStore {
    async fn query(&self, query: &MarketQuery) -> Result<MarketPage> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(PendingQuery {
                query: query.clone(),
                reply,
            })
            .map_err(|_| MarketError::Closed)?;
        rx.await
            .map_err(|_| MarketError::Query("request dropped by test".into()))?
    }
}
