//! In-process market table backed by DuckDB.
//!
//! Holds one row per (region, item). Used for offline snapshots and as the
//! reference store in tests. Queries run on the blocking thread pool via
//! [`tokio::task::spawn_blocking`] so awaiting them never stalls the
//! runtime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::SecondsFormat;
use duckdb::{types::ValueRef, Connection as DuckDbConnection, ToSql};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{into_page, MarketStore};
use crate::error::{MarketError, Result};
use crate::models::MarketItem;
use crate::query::{MarketPage, MarketQuery};

pub const TABLE: &str = "markets";

const COLUMNS: &[(&str, &str)] = &[
    ("id", "VARCHAR"),
    ("region", "VARCHAR"),
    ("name", "VARCHAR"),
    ("amount", "DOUBLE"),
    ("rarity", "INTEGER"),
    ("category", "VARCHAR"),
    ("subcategory", "VARCHAR"),
    ("image", "VARCHAR"),
    ("avgPrice", "DOUBLE"),
    ("cheapestRemaining", "DOUBLE"),
    ("lowPrice", "DOUBLE"),
    ("recentPrice", "DOUBLE"),
    // RFC 3339 in UTC, so text order is time order.
    ("updatedAt", "VARCHAR"),
];

/// DuckDB-backed [`MarketStore`].
///
/// Cloning shares the same database.
#[derive(Clone)]
pub struct DuckDbStore {
    conn: Arc<Mutex<DuckDbConnection>>,
}

impl DuckDbStore {
    /// Open an empty in-memory database with the market table created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        conn.execute_batch(&create_table_sql())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DuckDbConnection>> {
        self.conn
            .lock()
            .map_err(|_| MarketError::InvalidArgument("DuckDB lock poisoned".into()))
    }

    /// Insert items for a region. Existing rows are left alone.
    pub fn insert(&self, region: &str, items: &[MarketItem]) -> Result<()> {
        let conn = self.lock()?;
        let placeholders = vec!["?"; COLUMNS.len()].join(", ");
        let mut stmt = conn.prepare(&format!("INSERT INTO {} VALUES ({})", TABLE, placeholders))?;
        for item in items {
            let updated_at = item
                .updated_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
            let rarity = i32::from(item.rarity);
            let values: [&dyn ToSql; 13] = [
                &item.id,
                &region,
                &item.name,
                &item.amount,
                &rarity,
                &item.category,
                &item.subcategory,
                &item.image,
                &item.avg_price,
                &item.cheapest_remaining,
                &item.low_price,
                &item.recent_price,
                &updated_at,
            ];
            stmt.execute(values.as_slice())?;
        }
        Ok(())
    }

    /// Append rows from a newline-delimited JSON snapshot.
    ///
    /// Each line carries the item fields plus `region`. Returns the number of
    /// rows loaded.
    pub fn load_ndjson(&self, path: &str) -> Result<usize> {
        let path_fwd = path.replace('\\', "/").replace('\'', "''");
        let names: Vec<String> = COLUMNS.iter().map(|(c, _)| format!("\"{}\"", c)).collect();
        let types: Vec<String> = COLUMNS
            .iter()
            .map(|(c, t)| format!("'{}': '{}'", c, t))
            .collect();
        let sql = format!(
            "INSERT INTO {table} ({cols}) SELECT {cols} FROM read_json('{path}', \
             format='newline_delimited', columns={{{types}}})",
            table = TABLE,
            cols = names.join(", "),
            path = path_fwd,
            types = types.join(", "),
        );
        let conn = self.lock()?;
        let loaded = conn.execute(&sql, [])?;
        debug!(loaded, path, "loaded market snapshot");
        Ok(loaded)
    }

    /// Number of rows across all regions.
    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", TABLE), [], |row| {
            row.get(0)
        })?;
        Ok(n)
    }

    /// Run a query synchronously on the calling thread.
    pub fn query_blocking(&self, query: &MarketQuery) -> Result<MarketPage> {
        let (sql, params) = query.to_sql(TABLE);
        let conn = self.lock()?;
        let rows: Vec<MarketItem> = execute_into(&conn, &sql, &params)?;
        let (items, has_more) = into_page(rows, query.page.page_size);
        Ok(MarketPage { items, has_more })
    }
}

impl MarketStore for DuckDbStore {
    async fn query(&self, query: &MarketQuery) -> Result<MarketPage> {
        let store = self.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || store.query_blocking(&query))
            .await
            .map_err(|e| MarketError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

fn create_table_sql() -> String {
    let cols: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ty)| format!("\"{}\" {}", name, ty))
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", TABLE, cols.join(", "))
}

/// Execute SQL and deserialize each row into `T` through `serde_json`.
fn execute_into<T: DeserializeOwned>(
    conn: &DuckDbConnection,
    sql: &str,
    params: &[String],
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
    let mut rows = stmt.query(param_values.as_slice())?;

    // Column metadata is only available once the statement has run.
    let column_names: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names().into_iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut map = HashMap::with_capacity(column_names.len());
        for (i, name) in column_names.iter().enumerate() {
            map.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
        }
        let value = serde_json::Value::Object(map.into_iter().collect());
        out.push(serde_json::from_value(value)?);
    }
    Ok(out)
}

fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value;
    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Number(n.into()),
        ValueRef::SmallInt(n) => Value::Number(n.into()),
        ValueRef::Int(n) => Value::Number(n.into()),
        ValueRef::BigInt(n) => Value::Number(n.into()),
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        _ => Value::Null,
    }
}
