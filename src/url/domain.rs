//! Naive domain attributes
//!
//! The TLD is the last label only: `example.co.uk` reports `uk`, not
//! `co.uk`. Subdomain depth counts the labels in front of the last two.

use std::net::IpAddr;

/// Single-label hosts accepted as domains
const BARE_HOSTS: &[&str] = &["localhost"];

pub(crate) fn is_bare_host(host: &str) -> bool {
    BARE_HOSTS.contains(&host)
}

/// Returns true if the domain is an IPv4 or bracketed IPv6 literal
pub fn is_ip_literal(domain: &str) -> bool {
    let unbracketed = domain
        .strip_prefix('[')
        .and_then(|d| d.strip_suffix(']'))
        .unwrap_or(domain);
    unbracketed.parse::<IpAddr>().is_ok()
}

/// Extracts the top-level domain (last label)
///
/// # Returns
///
/// The last dot-separated label, or an empty string for IP literals and
/// single-label hosts
///
/// # Examples
///
/// ```
/// use robots_gate::url::extract_tld;
///
/// assert_eq!(extract_tld("blog.example.com"), "com");
/// assert_eq!(extract_tld("bbc.co.uk"), "uk");
/// assert_eq!(extract_tld("localhost"), "");
/// ```
pub fn extract_tld(domain: &str) -> &str {
    if is_ip_literal(domain) {
        return "";
    }
    match domain.rsplit_once('.') {
        Some((_, tld)) => tld,
        None => "",
    }
}

/// Counts the labels in front of the registrable domain
///
/// The registrable domain is taken to be the last two labels, so
/// `a.b.example.com` has depth 2 and `example.com` has depth 0.
pub fn subdomain_depth(domain: &str) -> u32 {
    if is_ip_literal(domain) {
        return 0;
    }
    let labels = domain.split('.').filter(|label| !label.is_empty()).count();
    labels.saturating_sub(2) as u32
}
