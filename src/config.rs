use std::path::PathBuf;
use std::time::Duration;

/// Region used when nothing has been persisted yet.
pub const DEFAULT_REGION: &str = "North America East";

/// Key-value keys read at startup.
pub const REGION_KEY: &str = "region";
pub const FAVORITES_KEY: &str = "favorites";

/// Category path segment that selects the favorites-only view.
pub const FAVORITES_SLUG: &str = "favorites";

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Shortest fragment the suggestion index will match against.
pub const SUGGESTION_MIN_LEN: usize = 3;

/// Where item icons are served from.
pub const ITEM_ICON_BASE: &str = "/assets/item_icons";

pub const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
pub const FIRESTORE_COLLECTION: &str = "markets";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn default_storage_dir() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("market-view")
    } else {
        PathBuf::from(".market-view")
    }
}
