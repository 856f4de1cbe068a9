use crate::UrlError;
use url::Url;

/// Normalizes a URL into the key used for frontier bookkeeping
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than HTTP and HTTPS
/// 3. Reject URLs without a host
/// 4. Remove fragment (everything after #)
/// 5. Remove empty query string (trailing ?)
///
/// Host lowercasing, default-port removal and dot-segment resolution are
/// already performed by the `url` parser. Paths are otherwise left as-is since
/// servers may treat `/page` and `/page/` differently.
///
/// # Examples
///
/// ```
/// use sumi_crawl::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../page?#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
