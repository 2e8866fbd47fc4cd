use crate::url::domain::is_bare_host;
use crate::url::Domain;
use crate::UrlError;
use url::{Host, Url};

/// Canonicalizes a URL string into its domain
///
/// # Canonicalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Parse the URL; reject if malformed or relative (no scheme)
/// 3. Accept only the `http` and `https` schemes
/// 4. Take the host; reject if missing
/// 5. Lowercase the host, drop the port and a trailing root dot
/// 6. Require a dotted name, `localhost`, or an IP literal
///
/// A leading `www.` is never removed. This function never panics, so batch
/// ingestion can skip a bad record and carry on.
///
/// # Arguments
///
/// * `input` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(Domain)` - The canonical domain
/// * `Err(UrlError)` - The input does not carry an HTTP(S) host
///
/// # Examples
///
/// ```
/// use robots_gate::url::canonicalize_url;
///
/// let domain = canonicalize_url("https://WWW.Example.COM:8443/a?b=c").unwrap();
/// assert_eq!(domain.as_str(), "www.example.com");
///
/// assert!(canonicalize_url("ftp://example.com/file").is_err());
/// assert!(canonicalize_url("example.com/no-scheme").is_err());
/// ```
pub fn canonicalize_url(input: &str) -> Result<Domain, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = match url.host() {
        Some(Host::Domain(name)) => {
            let name = name.trim_end_matches('.').to_lowercase();
            if name.is_empty() {
                return Err(UrlError::MissingDomain);
            }
            if !name.contains('.') && !is_bare_host(&name) {
                return Err(UrlError::Malformed(name));
            }
            name
        }
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => format!("[{}]", addr),
        None => return Err(UrlError::MissingDomain),
    };

    Ok(Domain::from_canonical(host))
}

/// Parses a bare host name (as found in domain list files) into a domain
///
/// The host goes through the same canonicalization as a URL host. Anything
/// beyond a host and optional port is rejected.
pub fn parse_domain(host: &str) -> Result<Domain, UrlError> {
    let trimmed = host.trim();
    if trimmed.contains(|c: char| matches!(c, '/' | '?' | '#' | '@') || c.is_whitespace()) {
        return Err(UrlError::Malformed(trimmed.to_string()));
    }
    canonicalize_url(&format!("http://{}/", trimmed))
}
