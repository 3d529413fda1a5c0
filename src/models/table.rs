use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;

use super::MarketItem;

// ---------------------------------------------------------------------------
// SortSpec: Column and direction chosen from the table header
// ---------------------------------------------------------------------------

/// Sortable table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Name,
    AvgPrice,
    RecentPrice,
    LowPrice,
    CheapestRemaining,
    UpdatedAt,
    Amount,
    Rarity,
}

impl SortField {
    /// Stored field name.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::AvgPrice => "avgPrice",
            SortField::RecentPrice => "recentPrice",
            SortField::LowPrice => "lowPrice",
            SortField::CheapestRemaining => "cheapestRemaining",
            SortField::UpdatedAt => "updatedAt",
            SortField::Amount => "amount",
            SortField::Rarity => "rarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

// ---------------------------------------------------------------------------
// PageWindow: Paginator position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub page_index: usize,
    pub page_size: usize,
}

impl PageWindow {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Number of rows before this page.
    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

// ---------------------------------------------------------------------------
// RowWindow: Published page of rows
// ---------------------------------------------------------------------------

/// The rows the table should render, tagged with the fetch generation that
/// produced them. Generation 0 is the empty window before any fetch settles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowWindow {
    pub generation: u64,
    pub items: Vec<MarketItem>,
    pub has_more: bool,
}

impl RowWindow {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name.as_str()).collect()
    }
}
