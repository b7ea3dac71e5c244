//! In-memory catalog used by unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use crate::catalog::client::CatalogApi;
use crate::catalog::model::{Dataset, DatasetSummary};
use crate::data::model::Record;
use crate::error::LoadError;

/// Serves canned payloads and records every call as `"op:arg"`.
#[derive(Default)]
pub struct FakeCatalog {
    search: Option<Vec<DatasetSummary>>,
    datasets: HashMap<String, Dataset>,
    records: HashMap<String, Vec<Record>>,
    downloads: HashMap<String, Vec<u8>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl FakeCatalog {
    pub fn with_search(mut self, hits: Vec<DatasetSummary>) -> Self {
        self.search = Some(hits);
        self
    }

    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.insert(dataset.id.clone(), dataset);
        self
    }

    /// `records` must be a JSON array of objects.
    pub fn with_records(mut self, resource_id: &str, records: JsonValue) -> Self {
        let records = records
            .as_array()
            .expect("records fixture must be an array")
            .iter()
            .map(|r| r.as_object().expect("record must be an object").clone())
            .collect();
        self.records.insert(resource_id.to_string(), records);
        self
    }

    pub fn with_download(mut self, url: &str, body: &str) -> Self {
        self.downloads.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

fn not_found(action: &'static str) -> LoadError {
    LoadError::Rejected {
        action,
        message: "Not found".to_string(),
    }
}

impl CatalogApi for FakeCatalog {
    fn search(&self, query: &str, rows: usize) -> Result<Vec<DatasetSummary>, LoadError> {
        self.record(format!("search:{query}:{rows}"));
        self.search
            .clone()
            .map(|hits| hits.into_iter().take(rows).collect())
            .ok_or_else(|| not_found("package_search"))
    }

    fn show(&self, dataset_id: &str) -> Result<Dataset, LoadError> {
        self.record(format!("show:{dataset_id}"));
        self.datasets
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| not_found("package_show"))
    }

    /// Ignores `limit` on purpose so callers must enforce their own cap.
    fn store_search(&self, resource_id: &str, limit: usize) -> Result<Vec<Record>, LoadError> {
        self.record(format!("store:{resource_id}:{limit}"));
        self.records
            .get(resource_id)
            .cloned()
            .ok_or_else(|| not_found("datastore_search"))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        self.record(format!("download:{url}"));
        self.downloads
            .get(url)
            .cloned()
            .ok_or_else(|| not_found("resource download"))
    }
}
