//! # License Source Seam
//!
//! The `license` field is validated against an external registry of
//! SPDX identifiers. This module defines the trait boundary so the
//! engine stays free of network concerns: `depot-spdx` provides the
//! HTTP-backed, TTL-cached implementation, and [`StaticLicenseSource`]
//! backs offline use and tests.

use std::collections::HashSet;

use thiserror::Error;

/// The license registry could not be consulted (network, timeout,
/// decode failure). Carries a description of the underlying failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ReferenceUnavailable(pub String);

/// Answers whether a license identifier is known to the registry.
///
/// `Ok(false)` means the identifier is genuinely unknown;
/// `Err(ReferenceUnavailable)` means the registry could not be
/// reached. Implementations must not conflate the two.
pub trait LicenseSource: Send + Sync {
    /// Exact, case-sensitive membership test.
    fn is_known(&self, id: &str) -> Result<bool, ReferenceUnavailable>;
}

impl<T: LicenseSource + ?Sized> LicenseSource for std::sync::Arc<T> {
    fn is_known(&self, id: &str) -> Result<bool, ReferenceUnavailable> {
        (**self).is_known(id)
    }
}

/// An in-memory license registry with a fixed identifier set.
#[derive(Debug, Clone, Default)]
pub struct StaticLicenseSource {
    ids: HashSet<String>,
}

impl StaticLicenseSource {
    /// Build a source from an iterator of identifiers.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl LicenseSource for StaticLicenseSource {
    fn is_known(&self, id: &str) -> Result<bool, ReferenceUnavailable> {
        Ok(self.ids.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_membership() {
        let source = StaticLicenseSource::new(["MIT", "Apache-2.0"]);
        assert_eq!(source.is_known("MIT"), Ok(true));
        assert_eq!(source.is_known("Apache-2.0"), Ok(true));
        assert_eq!(source.is_known("NotALicense"), Ok(false));
    }

    #[test]
    fn test_static_source_is_case_sensitive() {
        let source = StaticLicenseSource::new(["MIT"]);
        assert_eq!(source.is_known("mit"), Ok(false));
    }
}
