use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use super::client::CatalogApi;
use super::model::{Dataset, DatasetSummary};
use crate::data::model::Record;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Memo – one memo table keyed by exact request parameters
// ---------------------------------------------------------------------------

/// Session-lifetime memo table. Successful results are kept forever;
/// failures are never stored, so a retry re-hits the network.
#[derive(Debug)]
pub struct Memo<K, V> {
    entries: RefCell<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> Memo<K, V> {
    pub fn get_or_try_insert_with<E, F>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.entries.borrow().get(&key) {
            return Ok(hit.clone());
        }
        let value = fetch()?;
        self.entries.borrow_mut().insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

// ---------------------------------------------------------------------------
// ResponseCache – all memo tables of a session
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ResponseCache {
    searches: Memo<(String, usize), Vec<DatasetSummary>>,
    datasets: Memo<String, Dataset>,
    store_pages: Memo<(String, usize), Rc<Vec<Record>>>,
    downloads: Memo<String, Rc<Vec<u8>>>,
}

impl ResponseCache {
    /// Total number of memoized responses.
    pub fn len(&self) -> usize {
        self.searches.len() + self.datasets.len() + self.store_pages.len() + self.downloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// CachedCatalog – memoizing CatalogApi wrapper
// ---------------------------------------------------------------------------

/// Wraps any [`CatalogApi`] so identical requests are served from the
/// shared [`ResponseCache`] handle.
pub struct CachedCatalog<C> {
    inner: C,
    cache: Rc<ResponseCache>,
}

impl<C: CatalogApi> CachedCatalog<C> {
    pub fn new(inner: C, cache: Rc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl<C: CatalogApi> CatalogApi for CachedCatalog<C> {
    fn search(&self, query: &str, rows: usize) -> Result<Vec<DatasetSummary>, LoadError> {
        self.cache
            .searches
            .get_or_try_insert_with((query.to_string(), rows), || self.inner.search(query, rows))
    }

    fn show(&self, dataset_id: &str) -> Result<Dataset, LoadError> {
        self.cache
            .datasets
            .get_or_try_insert_with(dataset_id.to_string(), || self.inner.show(dataset_id))
    }

    fn store_search(&self, resource_id: &str, limit: usize) -> Result<Vec<Record>, LoadError> {
        let page = self.cache.store_pages.get_or_try_insert_with(
            (resource_id.to_string(), limit),
            || self.inner.store_search(resource_id, limit).map(Rc::new),
        )?;
        Ok(page.as_ref().clone())
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let bytes = self
            .cache
            .downloads
            .get_or_try_insert_with(url.to_string(), || self.inner.download(url).map(Rc::new))?;
        Ok(bytes.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalog;

    #[test]
    fn identical_requests_hit_the_network_once() {
        let fake = FakeCatalog::default().with_search(vec![DatasetSummary {
            id: "egresos".into(),
            title: None,
        }]);
        let calls = fake.calls();
        let catalog = CachedCatalog::new(fake, Rc::new(ResponseCache::default()));

        catalog.search("hospital", 20).unwrap();
        catalog.search("hospital", 20).unwrap();
        catalog.search("hospital", 10).unwrap();

        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(catalog.cache().len(), 2);
    }

    #[test]
    fn failures_are_not_memoized() {
        let fake = FakeCatalog::default();
        let calls = fake.calls();
        let catalog = CachedCatalog::new(fake, Rc::new(ResponseCache::default()));

        assert!(catalog.show("missing").is_err());
        assert!(catalog.show("missing").is_err());

        assert_eq!(calls.borrow().len(), 2);
        assert!(catalog.cache().is_empty());
    }

    #[test]
    fn store_pages_are_keyed_by_limit() {
        let fake = FakeCatalog::default().with_records("r1", serde_json::json!([{"a": 1}]));
        let calls = fake.calls();
        let catalog = CachedCatalog::new(fake, Rc::new(ResponseCache::default()));

        catalog.store_search("r1", 500).unwrap();
        catalog.store_search("r1", 500).unwrap();
        catalog.store_search("r1", 1000).unwrap();

        assert_eq!(calls.borrow().len(), 2);
    }
}
