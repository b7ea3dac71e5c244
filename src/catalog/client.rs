use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Dataset, DatasetSummary};
use crate::data::model::Record;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Catalog API seam
// ---------------------------------------------------------------------------

/// The catalog operations the pipeline consumes. Implemented by the HTTP
/// client, by the memoizing wrapper, and by fakes in tests.
pub trait CatalogApi {
    fn search(&self, query: &str, rows: usize) -> Result<Vec<DatasetSummary>, LoadError>;

    fn show(&self, dataset_id: &str) -> Result<Dataset, LoadError>;

    /// Up to `limit` records of a structured-store resource.
    fn store_search(&self, resource_id: &str, limit: usize) -> Result<Vec<Record>, LoadError>;

    /// Raw bytes behind a resource URL.
    fn download(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

// ---------------------------------------------------------------------------
// CKAN action API over blocking HTTP
// ---------------------------------------------------------------------------

/// `{ "success": bool, "result": ..., "error": {...} }`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: JsonValue,
    #[serde(default)]
    error: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    results: Vec<DatasetSummary>,
}

#[derive(Debug, Deserialize)]
struct StoreResult {
    #[serde(default)]
    records: Vec<Record>,
}

pub struct CkanClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl CkanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LoadError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| LoadError::Http {
                action: "client setup",
                source,
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn action<T: DeserializeOwned>(
        &self,
        action: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, LoadError> {
        let url = format!("{}/{action}", self.base_url);
        log::debug!("GET {url} {params:?}");

        let body = self
            .http
            .get(&url)
            .query(params)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|source| LoadError::Http { action, source })?;

        unwrap_envelope(action, &body)
    }
}

/// Decode a CKAN envelope and its `result` payload.
fn unwrap_envelope<T: DeserializeOwned>(action: &'static str, body: &str) -> Result<T, LoadError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|source| LoadError::Decode { action, source })?;

    if !envelope.success {
        let message = envelope
            .error
            .map(|e| match e.get("message").and_then(JsonValue::as_str) {
                Some(m) => m.to_string(),
                None => e.to_string(),
            })
            .unwrap_or_else(|| "no error detail".to_string());
        return Err(LoadError::Rejected { action, message });
    }

    serde_json::from_value(envelope.result).map_err(|source| LoadError::Decode { action, source })
}

impl CatalogApi for CkanClient {
    fn search(&self, query: &str, rows: usize) -> Result<Vec<DatasetSummary>, LoadError> {
        let result: SearchResult = self.action(
            "package_search",
            &[("q", query.to_string()), ("rows", rows.to_string())],
        )?;
        log::info!("package_search '{query}' returned {} datasets", result.results.len());
        Ok(result.results)
    }

    fn show(&self, dataset_id: &str) -> Result<Dataset, LoadError> {
        self.action("package_show", &[("id", dataset_id.to_string())])
    }

    fn store_search(&self, resource_id: &str, limit: usize) -> Result<Vec<Record>, LoadError> {
        let result: StoreResult = self.action(
            "datastore_search",
            &[("id", resource_id.to_string()), ("limit", limit.to_string())],
        )?;
        log::info!(
            "datastore_search {resource_id} returned {} records",
            result.records.len()
        );
        Ok(result.records)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        log::debug!("GET {url}");
        let bytes = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|source| LoadError::Http {
                action: "resource download",
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Serve a single connection on a local port and return its base URL.
    fn serve_once(respond: impl FnOnce(TcpStream) + Send + 'static) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                respond(stream);
            }
        });
        format!("http://{addr}")
    }

    fn read_request(stream: &mut TcpStream) {
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
    }

    #[test]
    fn envelope_yields_search_results() {
        let body = r#"{
            "success": true,
            "result": {"count": 2, "results": [
                {"id": "a", "title": "Egresos hospitalarios", "extra": 1},
                {"id": "b"}
            ]}
        }"#;
        let result: SearchResult = unwrap_envelope("package_search", body).unwrap();
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].display_title(), "Egresos hospitalarios");
        assert_eq!(result.results[1].title, None);
    }

    #[test]
    fn failed_envelope_surfaces_catalog_message() {
        let body = r#"{"success": false, "error": {"message": "Not found", "__type": "Not Found Error"}}"#;
        let err = unwrap_envelope::<Dataset>("package_show", body).unwrap_err();
        match err {
            LoadError::Rejected { action, message } => {
                assert_eq!(action, "package_show");
                assert_eq!(message, "Not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = unwrap_envelope::<Dataset>("package_show", "<html>").unwrap_err();
        assert!(matches!(err, LoadError::Decode { action: "package_show", .. }));
    }

    #[test]
    fn store_records_keep_field_order() {
        let body = r#"{"success": true, "result": {"records": [{"z": 1, "a": "x"}]}}"#;
        let result: StoreResult = unwrap_envelope("datastore_search", body).unwrap();
        let keys: Vec<&String> = result.records[0].keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = CkanClient::new("https://example.org/api/3/action/", Duration::from_secs(30)).unwrap();
        assert_eq!(client.base_url, "https://example.org/api/3/action");
    }

    #[test]
    fn server_errors_fail_the_call() {
        let base = serve_once(|mut stream| {
            read_request(&mut stream);
            let _ = stream.write_all(
                b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        });
        let client = CkanClient::new(&base, Duration::from_secs(5)).unwrap();

        match client.search("egresos", 5).unwrap_err() {
            LoadError::Http { action, source } => {
                assert_eq!(action, "package_search");
                assert_eq!(source.status().map(|s| s.as_u16()), Some(503));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_downloads_fail_the_call() {
        let base = serve_once(|mut stream| {
            read_request(&mut stream);
            let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        });
        let client = CkanClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.download(&format!("{base}/egresos.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Http { action: "resource download", .. }));
    }

    #[test]
    fn stalled_responses_time_out() {
        let base = serve_once(|mut stream| {
            read_request(&mut stream);
            thread::sleep(Duration::from_secs(3));
        });
        let client = CkanClient::new(&base, Duration::from_millis(300)).unwrap();

        match client.show("egresos-2020").unwrap_err() {
            LoadError::Http { action, source } => {
                assert_eq!(action, "package_show");
                assert!(source.is_timeout(), "expected a timeout, got {source}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
