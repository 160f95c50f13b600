//! Fetching package metadata from the registry.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::{Error, Result};
use crate::record::PackageRecord;

/// Source of package metadata records.
pub trait MetadataProvider {
    /// Fetch the latest release record of `name`.
    fn fetch(&self, name: &str) -> Result<PackageRecord>;
}

/// Default registry location.
pub const DEFAULT_REGISTRY: &str = "https://pypi.org";

/// Client for the PyPI JSON API (`GET /pypi/<name>/json`).
///
/// Transport errors and 5xx answers are retried a bounded number of times
/// with a linearly growing pause; a 404 is reported at once as
/// [`Error::PackageNotFound`].
pub struct PypiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl PypiClient {
    /// Client for `base_url` with a 30-second timeout and two retries.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, Duration::from_secs(30), 2)
    }

    /// Client with an explicit request timeout and retry count.
    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Duration,
        retries: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pypi-ebuild/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
        Ok(PypiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            retries,
            backoff: Duration::from_millis(500),
        })
    }

    /// Pause before the first retry; later retries wait proportionally longer.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Configured retry count.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/pypi/{}/json", self.base_url, name)
    }

    fn fetch_once(&self, name: &str) -> std::result::Result<String, Attempt> {
        let url = self.url_for(name);
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Attempt::Retry(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Attempt::NotFound);
        }
        if status.is_server_error() {
            return Err(Attempt::Retry(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(Attempt::Fail(format!("HTTP {status}")));
        }

        response.text().map_err(|e| Attempt::Retry(e.to_string()))
    }
}

enum Attempt {
    NotFound,
    Retry(String),
    Fail(String),
}

impl MetadataProvider for PypiClient {
    fn fetch(&self, name: &str) -> Result<PackageRecord> {
        let mut attempt = 0;
        let body = loop {
            match self.fetch_once(name) {
                Ok(body) => break body,
                Err(Attempt::NotFound) => return Err(Error::PackageNotFound(name.to_string())),
                Err(Attempt::Retry(message)) if attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        "fetching {name} failed ({message}), retry {attempt}/{}",
                        self.retries
                    );
                    thread::sleep(self.backoff * attempt);
                }
                Err(Attempt::Retry(message)) | Err(Attempt::Fail(message)) => {
                    return Err(Error::Fetch {
                        package: name.to_string(),
                        message,
                    })
                }
            }
        };
        PackageRecord::from_json(name, &body)
    }
}

/// Provider serving records from memory, keyed by registry name.
///
/// Useful for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    records: HashMap<String, PackageRecord>,
}

impl StaticProvider {
    /// An empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, served under its own name.
    pub fn insert(&mut self, record: PackageRecord) {
        self.records.insert(record.name.clone(), record);
    }
}

impl FromIterator<PackageRecord> for StaticProvider {
    fn from_iter<T: IntoIterator<Item = PackageRecord>>(iter: T) -> Self {
        let mut provider = StaticProvider::new();
        for record in iter {
            provider.insert(record);
        }
        provider
    }
}

impl MetadataProvider for StaticProvider {
    fn fetch(&self, name: &str) -> Result<PackageRecord> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const SIX: &str = r#"{"info": {"name": "six", "version": "1.16.0", "summary": "Python 2 and 3 compatibility utilities", "requires_dist": null}, "urls": []}"#;

    fn client(server: &MockServer, retries: u32) -> PypiClient {
        PypiClient::with_options(server.base_url(), Duration::from_secs(5), retries)
            .unwrap()
            .with_backoff(Duration::from_millis(1))
    }

    #[test]
    fn default_options() {
        let client = PypiClient::new(DEFAULT_REGISTRY).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(client.retries(), 2);
        assert_eq!(client.url_for("six"), "https://pypi.org/pypi/six/json");
    }

    #[test]
    fn fetches_record() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pypi/six/json");
            then.status(200).body(SIX);
        });

        let record = client(&server, 0).fetch("six").unwrap();
        mock.assert();
        assert_eq!(record.name, "six");
        assert_eq!(record.version, "1.16.0");
    }

    #[test]
    fn not_found_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pypi/nope/json");
            then.status(404);
        });

        let err = client(&server, 3).fetch("nope").unwrap_err();
        assert_eq!(err, Error::PackageNotFound("nope".to_string()));
        mock.assert_calls(1);
    }

    #[test]
    fn server_errors_are_retried_then_reported() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pypi/six/json");
            then.status(503);
        });

        let err = client(&server, 2).fetch("six").unwrap_err();
        assert!(matches!(err, Error::Fetch { ref package, .. } if package == "six"));
        mock.assert_calls(3);
    }

    #[test]
    fn client_errors_fail_immediately() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pypi/six/json");
            then.status(403);
        });

        let err = client(&server, 2).fetch("six").unwrap_err();
        assert!(matches!(err, Error::Fetch { ref message, .. } if message.contains("403")));
        mock.assert_calls(1);
    }

    #[test]
    fn malformed_body_is_schema_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pypi/six/json");
            then.status(200).body("not json");
        });

        let err = client(&server, 0).fetch("six").unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn static_provider_serves_inserted_records() {
        let provider: StaticProvider = [PackageRecord {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            ..Default::default()
        }]
        .into_iter()
        .collect();

        assert_eq!(provider.fetch("foo").unwrap().version, "1.0");
        assert_eq!(
            provider.fetch("bar").unwrap_err(),
            Error::PackageNotFound("bar".to_string())
        );
    }
}
