use tracing::debug;

use super::{LoaderState, SharedLists, TransactionLists};
use crate::api::{ApiError, Endpoint};
use crate::cache::CachedFetch;
use crate::models::{PaginatedRequestParams, PaginatedResponse, Transaction};

pub type TransactionPage = PaginatedResponse<Vec<Transaction>>;

/// Loads the all-transactions list page by page, appending each page.
#[derive(Clone)]
pub struct PaginatedTransactionsLoader {
    fetch: CachedFetch,
    lists: SharedLists,
}

impl PaginatedTransactionsLoader {
    pub fn new(fetch: CachedFetch) -> Self {
        Self::with_lists(fetch, SharedLists::default())
    }

    pub(crate) fn with_lists(fetch: CachedFetch, lists: SharedLists) -> Self {
        Self { fetch, lists }
    }

    /// Fetch page 0 when nothing is loaded, otherwise the current `next_page`.
    ///
    /// Callers must check `next_page()` first: a loaded list with no next
    /// page sends `{"page": null}`, which data sources reject.
    pub async fn fetch_all(&self) -> Result<(), ApiError> {
        self.fetch_all_then(|_| {}).await
    }

    /// `fetch_all`, then `then` runs under the same write lock as the merge.
    pub(crate) async fn fetch_all_then(&self, then: impl FnOnce(&mut TransactionLists)) -> Result<(), ApiError> {
        let page = match &self.lists.read().all {
            None => Some(0),
            Some(current) => current.next_page,
        };

        let response: TransactionPage = self
            .fetch
            .fetch_with_cache(Endpoint::PaginatedTransactions, &PaginatedRequestParams { page })
            .await?;
        debug!(?page, rows = response.data.len(), next_page = ?response.next_page, "Transaction page loaded");

        // Merge against whatever is current now, not what was read before the await
        let mut lists = self.lists.write();
        match lists.all.as_mut() {
            None => lists.all = Some(response),
            Some(previous) => {
                previous.data.extend(response.data);
                previous.next_page = response.next_page;
            }
        }
        then(&mut *lists);
        Ok(())
    }

    /// Drop everything; the next `fetch_all` starts over from page 0.
    pub fn invalidate_data(&self) {
        self.lists.write().all = None;
    }

    pub fn data(&self) -> Option<TransactionPage> {
        self.lists.read().all.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.read().all.is_none()
    }

    /// `None` both when nothing is loaded and when the last page was reached.
    pub fn next_page(&self) -> Option<u32> {
        self.lists.read().all.as_ref().and_then(|page| page.next_page)
    }

    pub fn loading(&self) -> bool {
        self.fetch.loading()
    }

    pub fn snapshot(&self) -> LoaderState<TransactionPage> {
        LoaderState {
            data: self.data(),
            loading: self.loading(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::cache::ResponseCache;
    use crate::test_support::{ann_lee, ids, scenario_handler, tx, ScriptedSource};

    fn loader() -> (PaginatedTransactionsLoader, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::new(scenario_handler));
        let fetch = CachedFetch::new(Arc::new(ResponseCache::new()), source.clone());
        (PaginatedTransactionsLoader::new(fetch), source)
    }

    #[tokio::test]
    async fn test_first_fetch_requests_page_zero() {
        let (loader, source) = loader();
        loader.fetch_all().await.unwrap();

        assert_eq!(source.calls(), vec![(Endpoint::PaginatedTransactions, json!({"page": 0}))]);
        let page = loader.data().unwrap();
        assert_eq!(ids(&page.data), vec!["tx_a"]);
        assert_eq!(loader.next_page(), Some(1));
    }

    #[tokio::test]
    async fn test_second_fetch_appends_next_page() {
        let (loader, _) = loader();
        loader.fetch_all().await.unwrap();
        loader.fetch_all().await.unwrap();

        let page = loader.data().unwrap();
        assert_eq!(ids(&page.data), vec!["tx_a", "tx_b"]);
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_merge_preserves_order_across_four_rows() {
        let source = Arc::new(ScriptedSource::new(|_, params| {
            let ann = ann_lee();
            match params["page"].as_u64() {
                Some(0) => Ok(json!({"data": [tx("t1", &ann), tx("t2", &ann)], "nextPage": 1})),
                Some(1) => Ok(json!({"data": [tx("t3", &ann), tx("t4", &ann)], "nextPage": null})),
                _ => Err(ApiError::InvalidRequest("bad page".to_string())),
            }
        }));
        let loader = PaginatedTransactionsLoader::new(CachedFetch::new(Arc::new(ResponseCache::new()), source));

        loader.fetch_all().await.unwrap();
        loader.fetch_all().await.unwrap();

        let page = loader.data().unwrap();
        assert_eq!(ids(&page.data), vec!["t1", "t2", "t3", "t4"]);
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_invalidate_restarts_from_page_zero() {
        let (loader, source) = loader();
        loader.fetch_all().await.unwrap();
        loader.fetch_all().await.unwrap();

        loader.invalidate_data();
        assert!(loader.is_empty());
        assert_eq!(loader.next_page(), None);

        loader.fetch_all().await.unwrap();
        assert_eq!(ids(&loader.data().unwrap().data), vec!["tx_a"]);
        // Page 0 came from the cache the second time
        assert_eq!(source.call_count(Endpoint::PaginatedTransactions), 2);
    }

    #[tokio::test]
    async fn test_fetch_past_last_page_sends_null_cursor_and_keeps_state() {
        let (loader, source) = loader();
        loader.fetch_all().await.unwrap();
        loader.fetch_all().await.unwrap();

        let err = loader.fetch_all().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(source.calls().last().unwrap().1, json!({"page": null}));
        assert_eq!(ids(&loader.data().unwrap().data), vec!["tx_a", "tx_b"]);
    }

    #[tokio::test]
    async fn test_fetch_all_then_runs_after_merge() {
        let (loader, _) = loader();
        loader.lists.write().filtered = Some(vec![]);

        loader
            .fetch_all_then(|lists| {
                assert!(lists.all.is_some());
                lists.filtered = None;
            })
            .await
            .unwrap();

        let lists = loader.lists.get();
        assert_eq!(ids(&lists.all.unwrap().data), vec!["tx_a"]);
        assert!(lists.filtered.is_none());
    }
}
