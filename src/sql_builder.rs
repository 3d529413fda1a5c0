//! SQL builder for market table queries.
//!
//! Every filter value is bound through DuckDB's `?` placeholders, never
//! interpolated. Column names are quoted so camelCase fields keep their
//! case. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use market_view::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("markets")
//!     .where_eq("region", "Europe West")
//!     .where_contains("name", "potion")
//!     .order_by("avgPrice", "DESC")
//!     .window(10, 0)
//!     .build();
//! ```

/// Builds parameterized `SELECT *` statements over a single table.
pub struct SqlBuilder {
    from_table: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_by_cols: Vec<String>,
    window: Option<(usize, usize)>,
}

/// Quote an identifier for DuckDB.
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl SqlBuilder {
    /// Create a builder targeting the given table.
    pub fn new(table: &str) -> Self {
        Self {
            from_table: ident(table),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_cols: Vec::new(),
            window: None,
        }
    }

    /// Add an equality condition: `"{column}" = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", ident(column)));
        self.params.push(value.to_string());
        self
    }

    /// Add a case-insensitive substring condition.
    ///
    /// Uses `contains` rather than LIKE so `%` and `_` in the needle match
    /// literally.
    pub fn where_contains(&mut self, column: &str, needle: &str) -> &mut Self {
        self.where_clauses
            .push(format!("contains(LOWER({}), LOWER(?))", ident(column)));
        self.params.push(needle.to_string());
        self
    }

    /// Add an IN condition with parameterized values.
    ///
    /// Empty values list produces `FALSE`.
    pub fn where_in(&mut self, column: &str, values: &[&str]) -> &mut Self {
        if values.is_empty() {
            self.where_clauses.push("FALSE".to_string());
            return self;
        }
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        self.where_clauses
            .push(format!("{} IN ({})", ident(column), placeholders.join(", ")));
        self.params.extend(values.iter().map(|v| v.to_string()));
        self
    }

    /// Add an ORDER BY term. NULLs always sort last so items without trade
    /// history stay at the bottom in both directions.
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        self.order_by_cols
            .push(format!("{} {} NULLS LAST", ident(column), direction));
        self
    }

    /// Return at most `limit` rows after skipping `offset`.
    pub fn window(&mut self, limit: usize, offset: usize) -> &mut Self {
        self.window = Some((limit, offset));
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut parts = vec![
            "SELECT *".to_string(),
            format!("FROM {}", self.from_table),
        ];

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some((limit, offset)) = self.window {
            parts.push(format!("LIMIT {limit}\nOFFSET {offset}"));
        }

        (parts.join("\n"), self.params.clone())
    }
}
