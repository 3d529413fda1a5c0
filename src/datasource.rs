//! Remote-backed table data source.
//!
//! [`MarketDataSource`] owns the (Filter, SortSpec, PageWindow) triple and is
//! the only thing that queries the store for the table. Sort and page come
//! in over `watch` channels and refetch on change; the filter is assigned
//! directly through [`MarketDataSource::set_filter`].
//!
//! All state lives in one driver task. Every fetch takes the next
//! generation number and runs concurrently with the driver. When a fetch
//! settles, its result is published only if no newer fetch has started in
//! the meantime, so the table never shows rows for a superseded request.
//! Superseded fetches are left to finish; their results are dropped.
//!
//! ```no_run
//! # use market_view::{DuckDbStore, Filter, MarketDataSource, PageWindow, SortSpec};
//! # async fn example() -> market_view::Result<()> {
//! let store = DuckDbStore::open_in_memory()?;
//! let (_sort_tx, sort_rx) = tokio::sync::watch::channel(SortSpec::default());
//! let (_page_tx, page_rx) = tokio::sync::watch::channel(PageWindow::default());
//! let mut source = MarketDataSource::new(
//!     store,
//!     sort_rx,
//!     page_rx,
//!     Filter::favorites("Europe West"),
//!     Vec::new(),
//! );
//! source.start()?;
//! let mut rows = source.connect();
//! let window = rows.wait_for(|w| w.generation > 0).await.map_err(|_| market_view::MarketError::Closed)?;
//! println!("{} rows", window.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::error::{MarketError, Result};
use crate::filter::Filter;
use crate::models::{FavoriteItem, PageWindow, RowWindow, SortSpec};
use crate::query::{self, MarketPage, MarketQuery};
use crate::store::MarketStore;

/// A fetch failure, tagged with the generation that produced it.
#[derive(Debug)]
pub struct FetchError {
    pub generation: u64,
    /// Whether a newer fetch had already started when this one failed.
    pub superseded: bool,
    pub error: MarketError,
}

/// Whether a fetch for the current parameters is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching(u64),
}

#[derive(Debug)]
enum Command {
    SetFilter(Filter),
    SetFavorites(Vec<FavoriteItem>),
    Refresh,
    Clear(String),
}

/// Handle to a market table data source.
///
/// Dropping the handle stops the driver.
pub struct MarketDataSource<S: MarketStore> {
    commands: mpsc::UnboundedSender<Command>,
    rows: watch::Receiver<RowWindow>,
    status: watch::Receiver<FetchStatus>,
    errors: Option<mpsc::UnboundedReceiver<FetchError>>,
    driver: Option<Driver<S>>,
    task: Option<JoinHandle<()>>,
}

impl<S: MarketStore> MarketDataSource<S> {
    /// Bind the data source to its inputs. Nothing is fetched until
    /// [`start`](Self::start).
    pub fn new(
        store: S,
        sort: watch::Receiver<SortSpec>,
        page: watch::Receiver<PageWindow>,
        filter: Filter,
        favorites: Vec<FavoriteItem>,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (rows_tx, rows) = watch::channel(RowWindow::default());
        let (status_tx, status) = watch::channel(FetchStatus::Idle);
        let (errors_tx, errors) = mpsc::unbounded_channel();

        let driver = Driver {
            store: Arc::new(store),
            commands: command_rx,
            sort,
            page,
            filter,
            favorites,
            generation: 0,
            in_flight: JoinSet::new(),
            rows: rows_tx,
            status: status_tx,
            errors: errors_tx,
        };

        Self {
            commands,
            rows,
            status,
            errors: Some(errors),
            driver: Some(driver),
            task: None,
        }
    }

    /// Spawn the driver on the current Tokio runtime and issue the first fetch.
    ///
    /// Fails without consuming the driver when called outside a runtime, so
    /// a later call from inside one still works.
    pub fn start(&mut self) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| {
            MarketError::InvalidArgument(format!("no Tokio runtime to start on: {e}"))
        })?;
        let driver = self
            .driver
            .take()
            .ok_or_else(|| MarketError::InvalidArgument("data source already started".into()))?;
        self.task = Some(runtime.spawn(driver.run()));
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.task.is_some()
    }

    /// Subscribe to published row windows.
    ///
    /// The receiver always holds the latest window; new subscribers see it
    /// immediately.
    pub fn connect(&self) -> watch::Receiver<RowWindow> {
        self.rows.clone()
    }

    pub fn status(&self) -> watch::Receiver<FetchStatus> {
        self.status.clone()
    }

    /// Take the fetch error channel. Returns `None` after the first call.
    pub fn errors(&mut self) -> Option<mpsc::UnboundedReceiver<FetchError>> {
        self.errors.take()
    }

    /// Replace the filter and refetch.
    ///
    /// A filter that cannot form a valid query is rejected here: the row
    /// window is cleared and the error is returned to the caller.
    pub fn set_filter(&self, filter: Filter) -> Result<()> {
        if let Err(e) = query::validate_filter(&filter) {
            self.send(Command::Clear(e.to_string()))?;
            return Err(e);
        }
        self.send(Command::SetFilter(filter))
    }

    /// Replace the favorites used for the favorites-only join.
    pub fn set_favorites(&self, favorites: Vec<FavoriteItem>) -> Result<()> {
        self.send(Command::SetFavorites(favorites))
    }

    /// Drop whatever is in flight and refetch the current parameters.
    pub fn refresh_market(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| MarketError::Closed)
    }
}

impl<S: MarketStore> Drop for MarketDataSource<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

struct Driver<S: MarketStore> {
    store: Arc<S>,
    commands: mpsc::UnboundedReceiver<Command>,
    sort: watch::Receiver<SortSpec>,
    page: watch::Receiver<PageWindow>,
    filter: Filter,
    favorites: Vec<FavoriteItem>,
    generation: u64,
    in_flight: JoinSet<(u64, Result<MarketPage>)>,
    rows: watch::Sender<RowWindow>,
    status: watch::Sender<FetchStatus>,
    errors: mpsc::UnboundedSender<FetchError>,
}

impl<S: MarketStore> Driver<S> {
    async fn run(mut self) {
        let mut sort_open = true;
        let mut page_open = true;
        self.sort.borrow_and_update();
        self.page.borrow_and_update();
        self.fetch();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                changed = self.sort.changed(), if sort_open => match changed {
                    Ok(()) => self.table_inputs_changed(),
                    Err(_) => sort_open = false,
                },
                changed = self.page.changed(), if page_open => match changed {
                    Ok(()) => self.table_inputs_changed(),
                    Err(_) => page_open = false,
                },
                Some(joined) = self.in_flight.join_next() => match joined {
                    Ok((generation, result)) => self.settle(generation, result),
                    Err(e) => warn!(error = %e, "market fetch task failed to complete"),
                },
            }
        }
        debug!("market data source stopped");
    }

    /// Sort and page often change together (a header click resets the
    /// page). Mark both as seen so the pair costs one fetch.
    fn table_inputs_changed(&mut self) {
        self.sort.borrow_and_update();
        self.page.borrow_and_update();
        self.fetch();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetFilter(filter) => {
                self.filter = filter;
                self.fetch();
            }
            Command::SetFavorites(favorites) => {
                self.favorites = favorites;
                if self.filter.favorites {
                    self.fetch();
                }
            }
            Command::Refresh => self.fetch(),
            Command::Clear(reason) => {
                let generation = self.next_generation();
                debug!(generation, %reason, "clearing market rows");
                self.publish(generation, MarketPage::default());
            }
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Start a fetch for the current parameters.
    fn fetch(&mut self) {
        let generation = self.next_generation();
        let sort = *self.sort.borrow();
        let page = *self.page.borrow();

        let query = match MarketQuery::build(&self.filter, sort, page, &self.favorites) {
            Ok(query) => query,
            Err(error) => {
                self.publish(generation, MarketPage::default());
                self.report(generation, error);
                return;
            }
        };

        debug!(generation, ?query, "issuing market query");
        self.status.send_replace(FetchStatus::Fetching(generation));
        let store = Arc::clone(&self.store);
        self.in_flight.spawn(async move {
            let result = store.query(&query).await;
            (generation, result)
        });
    }

    fn settle(&mut self, generation: u64, result: Result<MarketPage>) {
        let current = generation == self.generation;
        match result {
            Ok(page) if current => self.publish(generation, page),
            Ok(_) => debug!(generation, latest = self.generation, "discarding superseded market rows"),
            Err(error) => {
                if current && matches!(error, MarketError::InvalidQuery(_)) {
                    self.publish(generation, MarketPage::default());
                } else if current {
                    self.status.send_replace(FetchStatus::Idle);
                }
                self.report(generation, error);
            }
        }
    }

    fn publish(&mut self, generation: u64, page: MarketPage) {
        self.rows.send_replace(RowWindow {
            generation,
            items: page.items,
            has_more: page.has_more,
        });
        self.status.send_replace(FetchStatus::Idle);
    }

    fn report(&self, generation: u64, error: MarketError) {
        let superseded = generation != self.generation;
        warn!(generation, superseded, %error, "market fetch failed");
        let _ = self.errors.send(FetchError {
            generation,
            superseded,
            error,
        });
    }
}
