pub mod state;

pub use state::{Filter, Filters, QueryState, Sort, SortDirection, SortField};

use shared::types::{FeedbackItem, Page, SyncConfig, page_count};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::RequestGateway;

/// One fetched page of the table view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub items: Vec<FeedbackItem>,
    pub page_count: u32,
    pub total_count: u64,
}

/// Server-driven table: every setter changes `QueryState` and re-fetches.
///
/// The page index is kept in range: a page-size change clamps it to the last
/// page of the known total, a result with fewer pages than the index is
/// re-fetched at the last page, and a 404 for a page past the end falls back
/// to the first page.
pub struct ListQueryEngine {
    gateway: RequestGateway,
    state: QueryState,
    view: PageView,
}

impl ListQueryEngine {
    pub fn new(gateway: RequestGateway, page_size: u32) -> Self {
        Self {
            gateway,
            state: QueryState::new(page_size),
            view: PageView::default(),
        }
    }

    pub fn from_config(gateway: RequestGateway, config: &SyncConfig) -> Self {
        Self::new(gateway, config.default_page_size)
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn has_next(&self) -> bool {
        self.state.page_index + 1 < self.view.page_count
    }

    pub fn has_previous(&self) -> bool {
        self.state.page_index > 0
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    pub async fn set_filter(&mut self, filter: Filter) -> ClientResult<&PageView> {
        self.state.set_filter(filter);
        self.refresh().await
    }

    pub async fn set_sort(&mut self, sort: Option<Sort>) -> ClientResult<&PageView> {
        self.state.set_sort(sort);
        self.refresh().await
    }

    pub async fn toggle_sort(&mut self, field: SortField) -> ClientResult<&PageView> {
        self.state.toggle_sort(field);
        self.refresh().await
    }

    pub async fn set_page_size(&mut self, page_size: u32) -> ClientResult<&PageView> {
        if page_size == 0 {
            return Err(ClientError::InvalidArgument(
                "page size must be at least 1".into(),
            ));
        }
        self.state.page_size = page_size;

        let pages = page_count(self.view.total_count, page_size);
        if pages > 0 && self.state.page_index >= pages {
            debug!(
                "Page {} out of range for {} pages; clamping",
                self.state.page_index, pages
            );
            self.state.page_index = pages - 1;
        }
        self.refresh().await
    }

    pub async fn set_page_index(&mut self, page_index: u32) -> ClientResult<&PageView> {
        let pages = self.view.page_count;
        self.state.page_index = if pages > 0 && page_index >= pages {
            pages - 1
        } else {
            page_index
        };
        self.refresh().await
    }

    pub async fn next_page(&mut self) -> ClientResult<&PageView> {
        if !self.has_next() {
            return Ok(&self.view);
        }
        self.set_page_index(self.state.page_index + 1).await
    }

    pub async fn previous_page(&mut self) -> ClientResult<&PageView> {
        if !self.has_previous() {
            return Ok(&self.view);
        }
        self.set_page_index(self.state.page_index - 1).await
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    /// Fetch the page described by the current state.
    pub async fn refresh(&mut self) -> ClientResult<&PageView> {
        let mut page = match self.fetch_page().await {
            Err(ClientError::NotFound(_)) if self.state.page_index > 0 => {
                warn!(
                    "Page {} does not exist; returning to the first page",
                    self.state.page_index + 1
                );
                self.state.page_index = 0;
                self.fetch_page().await?
            }
            other => other?,
        };

        let mut pages = page.page_count(self.state.page_size);
        if pages == 0 {
            self.state.page_index = 0;
        } else if self.state.page_index >= pages {
            debug!(
                "Result has {} pages, index {} clamped",
                pages, self.state.page_index
            );
            self.state.page_index = pages - 1;
            page = self.fetch_page().await?;
            pages = page.page_count(self.state.page_size);
        }

        self.view = PageView {
            page_count: pages,
            total_count: page.count,
            items: page.results,
        };
        Ok(&self.view)
    }

    async fn fetch_page(&self) -> ClientResult<Page<FeedbackItem>> {
        let query = self.state.to_query_pairs();
        debug!("Fetching feedback page: {:?}", query);
        self.gateway.query_feedback(&query).await
    }
}
