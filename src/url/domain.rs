use std::net::IpAddr;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_crawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the rate limiting key for a URL: host plus explicit port
///
/// Two servers on the same host but different ports are paced independently.
pub fn domain_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

/// Returns the origin (`scheme://host[:port]`) robots.txt rules apply to
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_crawl::url::origin;
///
/// let url = Url::parse("http://example.com:8080/a/b").unwrap();
/// assert_eq!(origin(&url), "http://example.com:8080");
/// ```
pub fn origin(url: &Url) -> String {
    format!("{}://{}", url.scheme(), domain_key(url))
}

/// Returns the registrable domain (domain + public suffix) of a host
///
/// Suffixes come from the Public Suffix List, including its private section,
/// so `alice.github.io` and `bob.github.io` are distinct sites.
/// IP addresses, single-label hosts such as `localhost` and hosts that are
/// themselves a public suffix are returned as-is.
///
/// # Examples
///
/// ```
/// use sumi_crawl::url::registrable_domain;
///
/// assert_eq!(registrable_domain("api.v2.example.com"), "example.com");
/// assert_eq!(registrable_domain("shop.example.co.uk"), "example.co.uk");
/// assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host
        .trim_end_matches('.')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_lowercase();

    if host.parse::<IpAddr>().is_ok() {
        return host;
    }

    match psl::domain_str(&host) {
        Some(domain) => domain.to_string(),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_domain_key_with_port() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(domain_key(&url), "127.0.0.1:8080");
    }

    #[test]
    fn test_domain_key_default_port_omitted() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(domain_key(&url), "example.com");
    }

    #[test]
    fn test_origin() {
        let url = Url::parse("https://Example.com/private/x?y=1").unwrap();
        assert_eq!(origin(&url), "https://example.com");
    }

    #[test]
    fn test_registrable_domain_plain() {
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("a.test"), "a.test");
    }

    #[test]
    fn test_registrable_domain_subdomains() {
        assert_eq!(registrable_domain("sub.example.com"), "example.com");
        assert_eq!(registrable_domain("a.b.c.example.org"), "example.org");
        assert_eq!(registrable_domain("WWW.Example.COM."), "example.com");
    }

    #[test]
    fn test_registrable_domain_country_suffixes() {
        assert_eq!(registrable_domain("www.bbc.co.uk"), "bbc.co.uk");
        assert_eq!(registrable_domain("news.example.com.au"), "example.com.au");
        assert_eq!(registrable_domain("a.b.example.kyoto.jp"), "example.kyoto.jp");
    }

    #[test]
    fn test_registrable_domain_private_suffixes() {
        assert_eq!(registrable_domain("alice.github.io"), "alice.github.io");
        assert_eq!(registrable_domain("docs.alice.github.io"), "alice.github.io");
        assert_ne!(
            registrable_domain("alice.github.io"),
            registrable_domain("bob.github.io")
        );
        assert_eq!(registrable_domain("x.blogspot.com"), "x.blogspot.com");
    }

    #[test]
    fn test_bare_public_suffix_returned_as_is() {
        assert_eq!(registrable_domain("github.io"), "github.io");
        assert_eq!(registrable_domain("co.uk"), "co.uk");
    }

    #[test]
    fn test_registrable_domain_ip_and_localhost() {
        assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
        assert_eq!(registrable_domain("[::1]"), "::1");
        assert_eq!(registrable_domain("localhost"), "localhost");
    }
}
