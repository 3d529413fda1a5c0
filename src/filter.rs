//! Filter derivation from navigation state.
//!
//! [`FilterState`] folds navigation snapshots and search submissions into a
//! single [`Filter`]. The menu section and region slug shown alongside the
//! table are derived from that filter on demand rather than tracked
//! separately.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::categories::{self, MenuSection};
use crate::config::FAVORITES_SLUG;
use crate::error::Result;
use crate::query;
use crate::regions;

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Which subset of market items the table shows.
///
/// At most one selection mode is active: a category (with optional
/// subcategory), favorites only, or a free-text search. The `with_*`
/// constructors clear the other modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub favorites: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// The active selection mode of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode<'a> {
    Favorites,
    Category {
        category: &'a str,
        subcategory: Option<&'a str>,
    },
    Search(&'a str),
    /// Every item in the region.
    All,
}

impl Filter {
    /// Favorites-only filter, the state before any navigation.
    pub fn favorites(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            category: None,
            subcategory: None,
            favorites: true,
            search: None,
        }
    }

    pub fn with_favorites(&self) -> Self {
        Self::favorites(self.region.clone())
    }

    pub fn with_category(&self, category: String, subcategory: Option<String>) -> Self {
        Self {
            region: self.region.clone(),
            category: Some(category),
            subcategory,
            favorites: false,
            search: None,
        }
    }

    /// Search filter. A blank term yields the unfiltered region view.
    pub fn with_search(&self, search: &str) -> Self {
        let search = search.trim();
        Self {
            region: self.region.clone(),
            category: None,
            subcategory: None,
            favorites: false,
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }

    pub fn mode(&self) -> SelectionMode<'_> {
        if let Some(search) = self.search.as_deref() {
            return SelectionMode::Search(search);
        }
        if self.favorites {
            return SelectionMode::Favorites;
        }
        match self.category.as_deref() {
            Some(category) => SelectionMode::Category {
                category,
                subcategory: self.subcategory.as_deref(),
            },
            None => SelectionMode::All,
        }
    }

    /// URL-safe slug of the region, used for back links and addresses.
    pub fn region_slug(&self) -> String {
        regions::slugify(&self.region)
    }

    /// Menu section highlighted for this filter's category.
    pub fn menu_section(&self) -> Option<MenuSection> {
        MenuSection::for_category(self.category.as_deref())
    }
}

// ---------------------------------------------------------------------------
// NavigationSnapshot
// ---------------------------------------------------------------------------

/// Addresses are app-relative paths resolved against this origin.
const ADDRESS_BASE: &str = "http://localhost/";

/// Route state after a completed navigation.
///
/// A snapshot carries either a `search` query value or the
/// `region/category/subcategory` path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSnapshot {
    pub search: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl NavigationSnapshot {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn path(region: &str, category: Option<&str>, subcategory: Option<&str>) -> Self {
        Self {
            search: None,
            region: Some(region.to_string()),
            category: category.map(str::to_string),
            subcategory: subcategory.map(str::to_string),
        }
    }

    /// Parse a `/region/category/subcategory?search=term` address.
    ///
    /// A non-empty `search` query parameter wins over the path segments.
    pub fn from_address(address: &str) -> Self {
        let url = match Url::parse(ADDRESS_BASE).and_then(|base| base.join(address)) {
            Ok(url) => url,
            Err(e) => {
                debug!(address, error = %e, "unparsable address, treating as empty");
                return Self::default();
            }
        };

        if let Some((_, search)) = url
            .query_pairs()
            .find(|(key, value)| key == "search" && !value.is_empty())
        {
            return Self::search(search.into_owned());
        }

        let mut segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .map(|s| match urlencoding::decode(s) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => s.to_string(),
            });
        Self {
            search: None,
            region: segments.next(),
            category: segments.next(),
            subcategory: segments.next(),
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Address pushed to the browser history on search submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub title: String,
    pub path: String,
}

// ---------------------------------------------------------------------------
// FilterState
// ---------------------------------------------------------------------------

/// Holds the current [`Filter`] and the visible search-box text.
#[derive(Debug, Clone)]
pub struct FilterState {
    filter: Filter,
    search_text: String,
}

impl FilterState {
    /// Start in favorites mode for the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            filter: Filter::favorites(region),
            search_text: String::new(),
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn region_slug(&self) -> String {
        self.filter.region_slug()
    }

    pub fn menu_section(&self) -> Option<MenuSection> {
        self.filter.menu_section()
    }

    /// Fold one navigation snapshot into the filter.
    ///
    /// Unknown category or subcategory slugs fail with
    /// [`MarketError::UnknownCategory`](crate::MarketError::UnknownCategory),
    /// and a filter that cannot form a query fails with
    /// [`MarketError::InvalidQuery`](crate::MarketError::InvalidQuery). Either
    /// way the current filter is left untouched. A blank search value counts
    /// as no search.
    pub fn apply(&mut self, snapshot: &NavigationSnapshot) -> Result<&Filter> {
        let search = snapshot
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut next = match (search, snapshot.category.as_deref()) {
            (Some(search), _) => Filter {
                region: self.filter.region.clone(),
                category: None,
                subcategory: None,
                favorites: false,
                search: Some(search.to_string()),
            },
            (None, Some(FAVORITES_SLUG)) | (None, None) => self.filter.with_favorites(),
            (None, Some(category)) => {
                let resolved = categories::resolve(category, snapshot.subcategory.as_deref())?;
                self.filter
                    .with_category(resolved.category, resolved.subcategory)
            }
        };

        if let Some(region) = snapshot.region.as_deref().and_then(regions::lookup) {
            next.region = region.to_string();
        }
        query::validate_filter(&next)?;

        if let Some(search) = search {
            self.search_text = search.to_string();
        }
        self.filter = next;
        Ok(&self.filter)
    }

    /// Apply a direct search submission and return the address to show.
    pub fn submit_search(&mut self, term: &str) -> Address {
        self.search_text = term.to_string();
        self.filter = self.filter.with_search(term);

        let base = format!("/{}", self.region_slug());
        let path = match self.filter.search.as_deref() {
            Some(search) => format!("{}?search={}", base, urlencoding::encode(search)),
            None => base,
        };
        Address {
            title: self.filter.region.clone(),
            path,
        }
    }

    /// Replace the region, keeping the active selection mode.
    ///
    /// A blank region is rejected and leaves the filter untouched.
    pub fn set_region(&mut self, region: &str) -> Result<&Filter> {
        let next = Filter {
            region: region.trim().to_string(),
            ..self.filter.clone()
        };
        query::validate_filter(&next)?;
        self.filter = next;
        Ok(&self.filter)
    }
}
