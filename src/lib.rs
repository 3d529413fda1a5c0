//! Filter-driven live views over a remote market item store.
//!
//! Navigation state and search submissions are folded into a [`Filter`];
//! a [`MarketDataSource`] turns the filter, the table's sort column and the
//! paginator position into store queries and publishes the latest page of
//! rows. [`MarketView`] wires those pieces together with the persisted
//! favorites and the autocomplete index.
//!
//! # Quick start
//!
//! ```no_run
//! use market_view::{DuckDbStore, MarketView, NavigationSnapshot};
//!
//! # async fn example() -> market_view::Result<()> {
//! let store = DuckDbStore::open_in_memory()?;
//! let mut view = MarketView::builder(store)
//!     .suggestions(["Solar Grace", "Honor Leapstone"])
//!     .build()?;
//! view.start()?;
//!
//! view.navigate(&NavigationSnapshot::from_address("/europe-west/trader/mining-loot"))?;
//! let rows = view.rows().borrow().clone();
//! # Ok(())
//! # }
//! ```

pub mod categories;
pub mod config;
pub mod datasource;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod models;
pub mod query;
pub mod regions;
pub mod sql_builder;
pub mod store;
pub mod suggest;

pub use categories::{MenuSection, ResolvedCategory};
pub use datasource::{FetchError, FetchStatus, MarketDataSource};
pub use error::{MarketError, Result};
pub use favorites::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use filter::{Address, Filter, FilterState, NavigationSnapshot, SelectionMode};
pub use models::{
    FavoriteItem, MarketItem, PageWindow, RowWindow, SortDirection, SortField, SortSpec,
};
pub use query::{MarketPage, MarketQuery, Predicate};
pub use sql_builder::SqlBuilder;
pub use store::{DuckDbStore, FirestoreStore, MarketStore};
pub use suggest::SuggestionIndex;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::info;

// ---------------------------------------------------------------------------
// MarketViewBuilder
// ---------------------------------------------------------------------------

/// Builder for a [`MarketView`] over a given store.
///
/// Use [`MarketView::builder()`] to obtain one.
pub struct MarketViewBuilder<S: MarketStore> {
    store: S,
    storage_dir: Option<PathBuf>,
    key_value: Option<Arc<dyn KeyValueStore>>,
    default_region: Option<String>,
    page_size: Option<usize>,
    sort: SortSpec,
    suggestions: Vec<String>,
}

impl<S: MarketStore> MarketViewBuilder<S> {
    fn new(store: S) -> Self {
        Self {
            store,
            storage_dir: None,
            key_value: None,
            default_region: None,
            page_size: None,
            sort: SortSpec::default(),
            suggestions: Vec::new(),
        }
    }

    /// Directory for the persisted region and favorites.
    ///
    /// Ignored when [`key_value_store`](Self::key_value_store) is set.
    /// Defaults to the platform data directory.
    pub fn storage_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use an explicit key-value store instead of the file-backed one.
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value = Some(store);
        self
    }

    /// Region used when none has been persisted.
    pub fn default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Known item names offered as search suggestions.
    pub fn suggestions<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.suggestions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Read persisted state and bind the data source.
    ///
    /// Does not fetch; call [`MarketView::start`] from within a Tokio
    /// runtime.
    pub fn build(self) -> Result<MarketView<S>> {
        let key_value: Arc<dyn KeyValueStore> = match self.key_value {
            Some(kv) => kv,
            None => Arc::new(FileKeyValueStore::new(self.storage_dir)?),
        };

        let region = match self.default_region {
            Some(default) => favorites::load_region_or(key_value.as_ref(), default)?,
            None => favorites::load_region(key_value.as_ref())?,
        };
        let favorites = favorites::load_favorites(key_value.as_ref())?;

        let page = PageWindow::new(0, self.page_size.unwrap_or(config::DEFAULT_PAGE_SIZE));
        query::validate_page(page)?;

        let state = FilterState::new(region);
        let (sort_tx, sort_rx) = watch::channel(self.sort);
        let (page_tx, page_rx) = watch::channel(page);
        let source = MarketDataSource::new(
            self.store,
            sort_rx,
            page_rx,
            state.filter().clone(),
            favorites.clone(),
        );

        Ok(MarketView {
            state,
            suggestions: SuggestionIndex::new(self.suggestions),
            favorites,
            key_value,
            source,
            sort: sort_tx,
            page: page_tx,
        })
    }
}

// ---------------------------------------------------------------------------
// MarketView
// ---------------------------------------------------------------------------

/// The market page: filter state, favorites, suggestions and the table's
/// data source.
pub struct MarketView<S: MarketStore> {
    state: FilterState,
    suggestions: SuggestionIndex,
    favorites: Vec<FavoriteItem>,
    key_value: Arc<dyn KeyValueStore>,
    source: MarketDataSource<S>,
    sort: watch::Sender<SortSpec>,
    page: watch::Sender<PageWindow>,
}

impl<S: MarketStore> MarketView<S> {
    /// Create a builder for a view over `store`.
    pub fn builder(store: S) -> MarketViewBuilder<S> {
        MarketViewBuilder::new(store)
    }

    /// Start the data source, issuing the first fetch.
    pub fn start(&mut self) -> Result<()> {
        self.source.start()
    }

    // -- Derived state -----------------------------------------------------

    pub fn filter(&self) -> &Filter {
        self.state.filter()
    }

    pub fn region_slug(&self) -> String {
        self.state.region_slug()
    }

    pub fn menu_section(&self) -> Option<MenuSection> {
        self.state.menu_section()
    }

    pub fn search_text(&self) -> &str {
        self.state.search_text()
    }

    pub fn favorites(&self) -> &[FavoriteItem] {
        &self.favorites
    }

    // -- Navigation and search ---------------------------------------------

    /// Apply a navigation snapshot and refresh the table.
    ///
    /// Unknown categories fail without touching the filter or the table.
    pub fn navigate(&mut self, snapshot: &NavigationSnapshot) -> Result<()> {
        let filter = self.state.apply(snapshot)?.clone();
        self.source.set_filter(filter)
    }

    /// Apply snapshots in order until the stream ends or one fails.
    pub async fn follow<St>(&mut self, snapshots: St) -> Result<()>
    where
        St: Stream<Item = NavigationSnapshot>,
    {
        futures::pin_mut!(snapshots);
        while let Some(snapshot) = snapshots.next().await {
            self.navigate(&snapshot)?;
        }
        Ok(())
    }

    /// Update the visible search-box text.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.state.set_search_text(text);
    }

    /// Suggestions for the current search-box text.
    pub fn suggest(&self, fragment: &str) -> Vec<&str> {
        self.suggestions.suggest(fragment)
    }

    /// Submit the search box. Returns the address to push to the history.
    pub fn search(&mut self, term: &str) -> Result<Address> {
        let address = self.state.submit_search(term);
        if let Some(query) = self.state.filter().search.as_deref() {
            info!(query, "search");
        }
        self.source.set_filter(self.state.filter().clone())?;
        Ok(address)
    }

    // -- Table controls ----------------------------------------------------

    /// Change the sort column and go back to the first page.
    ///
    /// The page reset is written without notifying the data source; the
    /// sort notification that follows covers both, so the driver never
    /// sees the new page paired with the old sort.
    pub fn sort_by(&self, sort: SortSpec) {
        if *self.sort.borrow() == sort {
            return;
        }
        self.page.send_if_modified(|page| {
            page.page_index = 0;
            false
        });
        self.sort.send_replace(sort);
    }

    /// Move to another page of the current results.
    ///
    /// Fails with [`MarketError::InvalidQuery`] when the page offset
    /// overflows; the paginator is left where it was.
    pub fn go_to_page(&self, page_index: usize) -> Result<()> {
        let next = PageWindow::new(page_index, self.page.borrow().page_size);
        query::validate_page(next)?;
        self.page.send_if_modified(|page| {
            let modified = *page != next;
            *page = next;
            modified
        });
        Ok(())
    }

    /// Change the page size and go back to the first page.
    ///
    /// Sizes outside `1..=config::MAX_PAGE_SIZE` are rejected without a refetch.
    pub fn set_page_size(&self, page_size: usize) -> Result<()> {
        let next = PageWindow::new(0, page_size);
        query::validate_page(next)?;
        self.page.send_if_modified(|page| {
            let modified = *page != next;
            *page = next;
            modified
        });
        Ok(())
    }

    pub fn sort_spec(&self) -> SortSpec {
        *self.sort.borrow()
    }

    pub fn page_window(&self) -> PageWindow {
        *self.page.borrow()
    }

    // -- Persisted state ---------------------------------------------------

    /// Switch region, persist it and refresh.
    ///
    /// Nothing is persisted or changed when the region is rejected.
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        let mut state = self.state.clone();
        let filter = state.set_region(region)?.clone();
        favorites::save_region(self.key_value.as_ref(), &filter.region)?;
        self.state = state;
        self.source.set_filter(filter)
    }

    /// Add or remove a favorite. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, item: FavoriteItem) -> Result<bool> {
        let now_favorite = match self.favorites.iter().position(|f| *f == item) {
            Some(i) => {
                self.favorites.remove(i);
                false
            }
            None => {
                self.favorites.push(item);
                true
            }
        };
        favorites::save_favorites(self.key_value.as_ref(), &self.favorites)?;
        self.source.set_favorites(self.favorites.clone())?;
        Ok(now_favorite)
    }

    pub fn is_favorite(&self, item: &MarketItem) -> bool {
        self.favorites
            .iter()
            .any(|f| f.name == item.name && f.rarity == item.rarity)
    }

    // -- Data source -------------------------------------------------------

    /// Subscribe to the published row window.
    pub fn rows(&self) -> watch::Receiver<RowWindow> {
        self.source.connect()
    }

    pub fn status(&self) -> watch::Receiver<FetchStatus> {
        self.source.status()
    }

    /// Take the fetch error channel. Returns `None` after the first call.
    pub fn errors(&mut self) -> Option<mpsc::UnboundedReceiver<FetchError>> {
        self.source.errors()
    }

    /// Refetch the current parameters.
    pub fn refresh_market(&self) -> Result<()> {
        self.source.refresh_market()
    }

    pub fn data_source(&self) -> &MarketDataSource<S> {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl<S: MarketStore> fmt::Display for MarketView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = self.state.filter();
        let mode = match filter.mode() {
            SelectionMode::Favorites => "favorites".to_string(),
            SelectionMode::Category {
                category,
                subcategory: Some(sub),
            } => format!("{category} / {sub}"),
            SelectionMode::Category { category, .. } => category.to_string(),
            SelectionMode::Search(term) => format!("search {term:?}"),
            SelectionMode::All => "all".to_string(),
        };
        write!(
            f,
            "MarketView(region={}, mode={}, favorites={}, started={})",
            filter.region,
            mode,
            self.favorites.len(),
            self.source.is_started()
        )
    }
}
