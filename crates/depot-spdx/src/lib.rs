//! # depot-spdx — Cached SPDX License Registry
//!
//! Fetches the published SPDX license-list dataset over HTTP and
//! serves identifier lookups from a time-bounded in-memory snapshot.
//!
//! ## Caching Invariant
//!
//! A lookup never touches the network while `now - fetched_at < ttl`.
//! On expiry (or first use) exactly one caller performs the refetch —
//! concurrent stale callers serialize on a refresh lock, re-check
//! freshness after acquiring it, and all observe the same resulting
//! snapshot or the same failure (single-flight). Fresh reads take only
//! a read lock and never block each other.
//!
//! ## Error Contract
//!
//! "Identifier unknown" is `Ok(false)`; "registry unreachable" is
//! [`FetchError`]. Callers must never see the former when the truth is
//! the latter — the manifest engine maps `FetchError` into its
//! distinct reference-data-unavailable outcome.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use thiserror::Error;

use depot_manifest::{LicenseSource, ReferenceUnavailable};

/// Published SPDX license-list dataset.
pub const SPDX_LICENSE_LIST_URL: &str =
    "https://raw.githubusercontent.com/spdx/license-list-data/v3.6/json/licenses.json";

/// Default snapshot time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default bound on the network fetch. A fetch surfaces a
/// [`FetchError`] when this elapses; it never hangs.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The license registry could not be fetched or decoded.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("license registry request failed: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("license registry returned HTTP status {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("license registry response could not be decoded: {0}")]
    Decode(String),
}

/// Produces the raw identifier list for a snapshot. The HTTP
/// implementation is [`HttpLicenseFetcher`]; tests substitute their
/// own.
pub trait LicenseFetcher: Send + Sync {
    /// Fetch the complete identifier list.
    fn fetch(&self) -> Result<Vec<String>, FetchError>;
}

/// Wire shape of the SPDX dataset. Only `licenseId` is consumed.
#[derive(Debug, Deserialize)]
struct LicenseListDocument {
    #[serde(default)]
    licenses: Vec<LicenseEntry>,
}

#[derive(Debug, Deserialize)]
struct LicenseEntry {
    #[serde(rename = "licenseId")]
    license_id: String,
}

/// Blocking HTTP fetcher for the SPDX dataset.
#[derive(Debug)]
pub struct HttpLicenseFetcher {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpLicenseFetcher {
    /// Build a fetcher against the default endpoint and timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_endpoint(SPDX_LICENSE_LIST_URL, DEFAULT_FETCH_TIMEOUT)
    }

    /// Build a fetcher against a custom endpoint, with a bounded
    /// request timeout.
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl LicenseFetcher for HttpLicenseFetcher {
    fn fetch(&self) -> Result<Vec<String>, FetchError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching SPDX license list");
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let document: LicenseListDocument = response
            .json()
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(document
            .licenses
            .into_iter()
            .map(|entry| entry.license_id)
            .collect())
    }
}

/// One fetched copy of the registry, valid until its TTL elapses.
#[derive(Debug)]
pub struct LicenseSnapshot {
    identifiers: HashSet<String>,
    fetched_at: Instant,
    ttl: Duration,
}

impl LicenseSnapshot {
    /// Exact, case-sensitive membership test.
    pub fn contains(&self, id: &str) -> bool {
        self.identifiers.contains(id)
    }

    /// Number of known identifiers.
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Returns true when the snapshot holds no identifiers.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// When this snapshot was fetched.
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Whether the snapshot is still within its TTL.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.fetched_at) < self.ttl
    }
}

/// TTL-memoized SPDX identifier registry.
///
/// Cheap to share behind an `Arc`; lookups from a fresh snapshot take
/// a read lock only.
pub struct SpdxRegistry {
    fetcher: Box<dyn LicenseFetcher>,
    ttl: Duration,
    current: RwLock<Option<Arc<LicenseSnapshot>>>,
    /// Serializes refetches so concurrent stale callers trigger one
    /// network fetch, not one each. Guards the failure of the most
    /// recently completed cycle so waiters of that cycle share it.
    refresh: Mutex<RefreshCycle>,
    /// Completed refresh cycle count. A caller that queued on the
    /// refresh lock compares this against the value it observed before
    /// waiting to tell "someone refreshed while I queued" apart from
    /// "it is my turn to refresh".
    generation: AtomicU64,
}

/// State of the last completed refresh, guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshCycle {
    failure: Option<FetchError>,
}

impl SpdxRegistry {
    /// Registry against the published SPDX endpoint with the default
    /// TTL and timeout.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self::with_fetcher(
            Box::new(HttpLicenseFetcher::new()?),
            DEFAULT_TTL,
        ))
    }

    /// Replace the snapshot TTL, builder style. Existing snapshots
    /// keep the TTL they were fetched with.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Registry over a custom fetcher and TTL. No fetch happens until
    /// the first lookup.
    pub fn with_fetcher(fetcher: Box<dyn LicenseFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            current: RwLock::new(None),
            refresh: Mutex::new(RefreshCycle::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// The current snapshot, refetching first if absent or expired.
    ///
    /// Single-flight: of the callers that find the snapshot stale at
    /// the same time, exactly one fetches; the rest queue on the
    /// refresh lock and share that cycle's outcome — the stored
    /// snapshot on success, a clone of the same [`FetchError`] on
    /// failure. A failed cycle stores no snapshot, so a genuinely new
    /// call retries.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of this cycle's refetch.
    pub fn snapshot(&self) -> Result<Arc<LicenseSnapshot>, FetchError> {
        let now = Instant::now();
        if let Some(snapshot) = self.fresh(now) {
            return Ok(snapshot);
        }

        let observed = self.generation.load(Ordering::SeqCst);
        let mut cycle = self.refresh.lock();
        // Another caller may have refreshed while we queued.
        if let Some(snapshot) = self.fresh(Instant::now()) {
            return Ok(snapshot);
        }
        if self.generation.load(Ordering::SeqCst) != observed {
            // A refresh cycle completed while we queued. No fresh
            // snapshot, so it failed (or already expired under a tiny
            // TTL): share its failure rather than fetching again.
            if let Some(err) = &cycle.failure {
                return Err(err.clone());
            }
        }

        let result = match self.fetcher.fetch() {
            Ok(identifiers) => {
                tracing::debug!(count = identifiers.len(), "SPDX license list refreshed");
                let snapshot = Arc::new(LicenseSnapshot {
                    identifiers: identifiers.into_iter().collect(),
                    fetched_at: Instant::now(),
                    ttl: self.ttl,
                });
                *self.current.write() = Some(snapshot.clone());
                cycle.failure = None;
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "SPDX license list refresh failed");
                cycle.failure = Some(e.clone());
                Err(e)
            }
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        result
    }

    /// Membership lookup through the cache.
    pub fn is_known(&self, id: &str) -> Result<bool, FetchError> {
        Ok(self.snapshot()?.contains(id))
    }

    fn fresh(&self, now: Instant) -> Option<Arc<LicenseSnapshot>> {
        self.current
            .read()
            .as_ref()
            .filter(|s| s.is_fresh(now))
            .cloned()
    }
}

impl LicenseSource for SpdxRegistry {
    fn is_known(&self, id: &str) -> Result<bool, ReferenceUnavailable> {
        SpdxRegistry::is_known(self, id).map_err(|e| ReferenceUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches; optionally sleeps to widen the refresh window,
    /// optionally fails.
    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    impl LicenseFetcher for CountingFetcher {
        fn fetch(&self) -> Result<Vec<String>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            if self.fail {
                return Err(FetchError::Http("connection refused".to_string()));
            }
            Ok(vec!["MIT".to_string(), "Apache-2.0".to_string()])
        }
    }

    // ---- TTL memoization ----

    #[test]
    fn test_lookup_within_ttl_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher::new(calls.clone())),
            Duration::from_secs(3600),
        );

        assert!(registry.is_known("MIT").unwrap());
        assert!(!registry.is_known("Unknown-1.0").unwrap());
        assert!(registry.is_known("Apache-2.0").unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_snapshot_refetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher::new(calls.clone())),
            Duration::ZERO,
        );

        registry.is_known("MIT").unwrap();
        registry.is_known("MIT").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_fetch_before_first_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let _registry = SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher::new(calls.clone())),
            DEFAULT_TTL,
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // ---- failure semantics ----

    #[test]
    fn test_fetch_failure_is_not_unknown_identifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::ZERO,
                fail: true,
            }),
            DEFAULT_TTL,
        );

        let err = registry.is_known("MIT").unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        // Nothing cached: the next lookup retries.
        registry.is_known("MIT").unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_license_source_maps_fetch_error() {
        let registry = SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher {
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
                fail: true,
            }),
            DEFAULT_TTL,
        );
        let source: &dyn LicenseSource = &registry;
        assert!(source.is_known("MIT").is_err());
    }

    // ---- single-flight ----

    #[test]
    fn test_concurrent_cold_lookups_fetch_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::from_millis(50),
                fail: false,
            }),
            Duration::from_secs(3600),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.snapshot().unwrap())
            })
            .collect();

        let snapshots: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // All callers observe the same snapshot.
        for pair in snapshots.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[test]
    fn test_concurrent_failed_refresh_fetches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher {
                calls: calls.clone(),
                delay: Duration::from_millis(200),
                fail: true,
            }),
            Duration::from_secs(3600),
        ));

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.snapshot()
                })
            })
            .collect();

        // Every waiter of the one in-flight cycle observes the same
        // failure; none re-issues the fetch.
        for h in handles {
            let err = h.join().unwrap().unwrap_err();
            assert!(matches!(err, FetchError::Http(_)), "got {err:?}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A later, genuinely new call is a new cycle and retries.
        registry.snapshot().unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fresh_reads_do_not_refetch_under_concurrency() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(SpdxRegistry::with_fetcher(
            Box::new(CountingFetcher::new(calls.clone())),
            Duration::from_secs(3600),
        ));
        registry.snapshot().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.is_known("MIT").unwrap())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // ---- wire decoding ----

    #[test]
    fn test_license_list_document_shape() {
        let raw = r#"{
            "licenseListVersion": "3.6",
            "licenses": [
                {"licenseId": "MIT", "name": "MIT License", "isOsiApproved": true},
                {"licenseId": "Apache-2.0", "name": "Apache License 2.0"}
            ]
        }"#;
        let document: LicenseListDocument = serde_json::from_str(raw).unwrap();
        let ids: Vec<_> = document
            .licenses
            .into_iter()
            .map(|e| e.license_id)
            .collect();
        assert_eq!(ids, ["MIT", "Apache-2.0"]);
    }

    #[test]
    fn test_snapshot_freshness() {
        let snapshot = LicenseSnapshot {
            identifiers: HashSet::new(),
            fetched_at: Instant::now(),
            ttl: Duration::from_secs(1),
        };
        assert!(snapshot.is_fresh(snapshot.fetched_at()));
        assert!(!snapshot.is_fresh(snapshot.fetched_at() + Duration::from_secs(2)));
    }
}
