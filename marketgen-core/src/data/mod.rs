//! Data retrieval, persistence, and alignment.

pub mod fetch;
pub mod history;
pub mod panel;
pub mod provider;
pub mod yahoo;

pub use fetch::{fetch_histories, FetchError, FetchSummary};
pub use history::{HistoryStore, StoreError, HISTORY_COLUMNS};
pub use panel::{ClosePanel, EmptyPanelError};
pub use provider::{DailyBar, DataError, DataProvider, FetchProgress, SilentProgress, StdoutProgress};
pub use yahoo::YahooProvider;
