//! URL handling module for Robots-Gate
//!
//! This module turns arbitrary URL strings into canonical [`Domain`] values
//! and derives the naive TLD and subdomain-depth attributes used in domain
//! statistics.

mod canonical;
mod domain;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// Re-export main functions
pub use canonical::{canonicalize_url, parse_domain};
pub use domain::{extract_tld, is_ip_literal, subdomain_depth};

/// Canonical host of a URL: lowercase, without scheme, port or path
///
/// A leading `www.` is kept, so `www.example.com` and `example.com` are two
/// distinct domains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Returns the domain as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the domain and returns the inner string
    pub fn into_inner(self) -> String {
        self.0
    }

    pub(crate) fn from_canonical(host: String) -> Self {
        Self(host)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
