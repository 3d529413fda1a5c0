//! Firestore REST backend.
//!
//! Translates a [`MarketQuery`] into a `runQuery` structured query against
//! the market collection. Firestore has no substring match, so a search
//! becomes a name prefix range, and because range filters must lead the
//! ordering, search results are ordered by name before the chosen column.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{into_page, MarketStore};
use crate::config::{DEFAULT_HTTP_TIMEOUT, FIRESTORE_BASE, FIRESTORE_COLLECTION};
use crate::error::{MarketError, Result};
use crate::models::{MarketItem, SortDirection, SortField};
use crate::query::{MarketPage, MarketQuery, Predicate};

/// Firestore limits `IN` filters to this many values.
const MAX_IN_VALUES: usize = 30;

pub struct FirestoreStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    /// Store for `project_id` with the default request timeout.
    pub fn for_project(project_id: &str, api_key: Option<String>) -> Result<Self> {
        Self::new(project_id, api_key, DEFAULT_HTTP_TIMEOUT)
    }

    /// Build a store for the default database of `project_id`.
    pub fn new(project_id: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/projects/{}/databases/(default)/documents:runQuery",
                FIRESTORE_BASE, project_id
            ),
            api_key,
        })
    }

    /// Point the store at a different `runQuery` URL, e.g. the emulator.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl MarketStore for FirestoreStore {
    async fn query(&self, query: &MarketQuery) -> Result<MarketPage> {
        if matches!(&query.predicate, Predicate::Names(names) if names.is_empty()) {
            return Ok(MarketPage::default());
        }
        let body = structured_query(query)?;
        debug!(endpoint = %self.endpoint, "running firestore query");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let results: Vec<RunQueryResponse> = request.send().await?.error_for_status()?.json().await?;

        let mut rows = Vec::with_capacity(results.len());
        for result in results {
            if let Some(doc) = result.document {
                rows.push(decode_document(doc)?);
            }
        }
        let (items, has_more) = into_page(rows, query.page.page_size);
        Ok(MarketPage { items, has_more })
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

fn field_filter(field: &str, op: &str, value: Value) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": field },
            "op": op,
            "value": value,
        }
    })
}

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn order(field: &str, direction: SortDirection) -> Value {
    let direction = match direction {
        SortDirection::Asc => "ASCENDING",
        SortDirection::Desc => "DESCENDING",
    };
    json!({ "field": { "fieldPath": field }, "direction": direction })
}

/// Build the `runQuery` request body.
pub(crate) fn structured_query(query: &MarketQuery) -> Result<Value> {
    let mut filters = vec![field_filter("region", "EQUAL", string_value(&query.region))];
    let mut orders = Vec::new();

    match &query.predicate {
        Predicate::Names(names) => {
            if names.len() > MAX_IN_VALUES {
                return Err(MarketError::InvalidQuery(format!(
                    "{} favorites exceed the store limit of {}",
                    names.len(),
                    MAX_IN_VALUES
                )));
            }
            let values: Vec<Value> = names.iter().map(|n| string_value(n)).collect();
            filters.push(field_filter(
                "name",
                "IN",
                json!({ "arrayValue": { "values": values } }),
            ));
        }
        Predicate::Category {
            category,
            subcategory,
        } => {
            filters.push(field_filter("category", "EQUAL", string_value(category)));
            if let Some(sub) = subcategory {
                filters.push(field_filter("subcategory", "EQUAL", string_value(sub)));
            }
        }
        Predicate::Search(term) => {
            filters.push(field_filter(
                "name",
                "GREATER_THAN_OR_EQUAL",
                string_value(term),
            ));
            filters.push(field_filter(
                "name",
                "LESS_THAN",
                string_value(&format!("{}\u{f8ff}", term)),
            ));
            let direction = match query.sort.field {
                SortField::Name => query.sort.direction,
                _ => SortDirection::Asc,
            };
            orders.push(order("name", direction));
        }
        Predicate::None => {}
    }

    let column = query.sort.field.column();
    if orders.is_empty() || column != "name" {
        orders.push(order(column, query.sort.direction));
    }

    Ok(json!({
        "structuredQuery": {
            "from": [{ "collectionId": FIRESTORE_COLLECTION }],
            "where": { "compositeFilter": { "op": "AND", "filters": filters } },
            "orderBy": orders,
            "offset": query.page.offset(),
            "limit": query.page.page_size + 1,
        }
    }))
}

/// Unwrap Firestore's typed value encoding into plain JSON.
fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = obj.get("stringValue") {
        return s.clone();
    }
    if let Some(t) = obj.get("timestampValue") {
        return t.clone();
    }
    if let Some(d) = obj.get("doubleValue") {
        return d.clone();
    }
    if let Some(i) = obj.get("integerValue") {
        // Integers arrive as decimal strings.
        return i
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null);
    }
    if let Some(b) = obj.get("booleanValue") {
        return b.clone();
    }
    Value::Null
}

fn decode_document(doc: Document) -> Result<MarketItem> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let mut fields: Map<String, Value> = doc
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect();
    fields.insert("id".to_string(), Value::String(id));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageWindow, SortSpec};

    fn query(predicate: Predicate) -> MarketQuery {
        MarketQuery {
            region: "Europe West".into(),
            predicate,
            sort: SortSpec::new(SortField::AvgPrice, SortDirection::Desc),
            page: PageWindow::new(1, 20),
        }
    }

    #[test]
    fn category_query_filters_and_pages() {
        let body = structured_query(&query(Predicate::Category {
            category: "Trader".into(),
            subcategory: Some("Mining Loot".into()),
        }))
        .unwrap();
        let sq = &body["structuredQuery"];
        assert_eq!(sq["where"]["compositeFilter"]["filters"].as_array().unwrap().len(), 3);
        assert_eq!(sq["orderBy"][0]["field"]["fieldPath"], "avgPrice");
        assert_eq!(sq["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(sq["offset"], 20);
        assert_eq!(sq["limit"], 21);
    }

    #[test]
    fn search_orders_by_name_first() {
        let body = structured_query(&query(Predicate::Search("Oreha".into()))).unwrap();
        let orders = body["structuredQuery"]["orderBy"].as_array().unwrap();
        assert_eq!(orders[0]["field"]["fieldPath"], "name");
        assert_eq!(orders[1]["field"]["fieldPath"], "avgPrice");
    }

    #[test]
    fn too_many_favorites_is_invalid() {
        let names = (0..31).map(|i| format!("item {i}")).collect();
        let err = structured_query(&query(Predicate::Names(names))).unwrap_err();
        assert!(matches!(err, MarketError::InvalidQuery(_)));
    }

    #[test]
    fn decodes_typed_document_fields() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/markets/abc123",
            "fields": {
                "name": { "stringValue": "Solar Grace" },
                "amount": { "integerValue": "10" },
                "rarity": { "integerValue": "2" },
                "category": { "stringValue": "Enhancement Material" },
                "subcategory": { "stringValue": "Additional Honing Materials" },
                "image": { "stringValue": "solar-grace.webp" },
                "avgPrice": { "doubleValue": 12.5 },
                "updatedAt": { "timestampValue": "2022-03-01T10:00:00Z" }
            }
        }))
        .unwrap();
        let item = decode_document(doc).unwrap();
        assert_eq!(item.id, "abc123");
        assert_eq!(item.rarity, 2);
        assert_eq!(item.avg_price, Some(12.5));
        assert_eq!(item.low_price, None);
        assert!(item.updated_at.is_some());
    }

    #[tokio::test]
    async fn empty_favorites_skip_the_request() {
        let store = FirestoreStore::for_project("demo-project", None)
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/unreachable");
        let page = store.query(&query(Predicate::Names(Vec::new()))).await.unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }
}
