//! HTML content extraction
//!
//! This module turns a fetched HTML document into:
//! - Markdown-flavoured main text (headings, paragraphs, lists, quotes, code)
//! - Title, description and keywords (with OpenGraph fallbacks)
//! - Links to follow (from <a> tags and canonical links)
//! - Image URLs

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose content is never part of the page text
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "footer", "header", "aside",
];

/// Block elements emitted as text; nested blocks are covered by their parent
const TEXT_BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "li",
];

/// Everything the crawler keeps from a page's HTML
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub text: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    /// Absolute, deduplicated HTTP(S) links in document order
    pub links: Vec<Url>,
    /// Absolute, deduplicated image URLs (empty unless image extraction is on)
    pub images: Vec<Url>,
}

/// Converts HTML into text, metadata and links
///
/// Implementations never fail: malformed HTML yields best-effort (possibly
/// empty) values.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, url: &Url) -> Extracted;
}

/// `scraper`-based extractor used by default
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor {
    extract_images: bool,
}

impl HtmlExtractor {
    pub fn new(extract_images: bool) -> Self {
        Self { extract_images }
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str, url: &Url) -> Extracted {
        let document = Html::parse_document(html);

        Extracted {
            text: extract_text(&document),
            title: extract_title(&document),
            description: extract_description(&document),
            keywords: extract_keywords(&document),
            links: extract_links(&document, url),
            images: if self.extract_images {
                extract_images(&document, url)
            } else {
                Vec::new()
            },
        }
    }
}

fn select_first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Extracts the page title, falling back to `og:title`
fn extract_title(document: &Html) -> Option<String> {
    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    });

    title.or_else(|| select_first_attr(document, r#"meta[property="og:title"]"#, "content"))
}

/// Extracts the meta description, falling back to `og:description`
fn extract_description(document: &Html) -> Option<String> {
    select_first_attr(document, r#"meta[name="description"]"#, "content").or_else(|| {
        select_first_attr(document, r#"meta[property="og:description"]"#, "content")
    })
}

fn extract_keywords(document: &Html) -> Vec<String> {
    select_first_attr(document, r#"meta[name="keywords"]"#, "content")
        .map(|content| {
            content
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts the main text as lightweight markdown
///
/// The first of `main`, `article`, `body` is used as the content root.
/// Boilerplate regions (navigation, headers, footers, sidebars, scripts) are
/// skipped.
fn extract_text(document: &Html) -> String {
    let root = ["main", "article", "body"]
        .iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let blocks = match Selector::parse(&TEXT_BLOCK_TAGS.join(", ")) {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    let mut parts = Vec::new();
    for element in root.select(&blocks) {
        if has_ancestor_in(&element, BOILERPLATE_TAGS) || has_ancestor_in(&element, TEXT_BLOCK_TAGS)
        {
            continue;
        }

        if let Some(part) = render_block(&element) {
            parts.push(part);
        }
    }

    parts.join("\n\n")
}

fn render_block(element: &ElementRef) -> Option<String> {
    let name = element.value().name();

    if name == "pre" {
        let code = element.text().collect::<String>();
        let code = code.trim_matches('\n').trim_end();
        if code.trim().is_empty() {
            return None;
        }
        let language = code_language(element).unwrap_or_default();
        return Some(format!("```{}\n{}\n```", language, code));
    }

    let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
    if text.is_empty() {
        return None;
    }

    let rendered = match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            format!("{} {}", "#".repeat(level), text)
        }
        "blockquote" => format!("> {}", text),
        "li" => format!("- {}", text),
        _ => text,
    };

    Some(rendered)
}

/// Reads a `language-x` / `lang-x` class from a `<pre>` or its `<code>` child
fn code_language(pre: &ElementRef) -> Option<String> {
    let code = Selector::parse("code")
        .ok()
        .and_then(|selector| pre.select(&selector).next());

    code.iter()
        .chain(std::iter::once(pre))
        .flat_map(|el| el.value().classes())
        .find_map(|class| {
            let class = class.to_lowercase();
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
}

fn has_ancestor_in(element: &ElementRef, tags: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|el| tags.contains(&el.name()))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all followable links from the HTML document
///
/// **Include:** `<a href>` anywhere in the document and
/// `<link rel="canonical">`. **Exclude:** `<a download>`, `javascript:`,
/// `mailto:`, `tel:` and `data:` links, fragment-only anchors and non-HTTP(S)
/// targets. `rel="nofollow"` links are followed.
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |url: Url| {
        if seen.insert(url.clone()) {
            links.push(url);
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                push(url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                push(url);
            }
        }
    }

    links
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| resolve_link(src, base_url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Resolves an href against the page URL
///
/// Returns None for special schemes, fragment-only links, unparsable hrefs
/// and anything that is not HTTP(S) after resolution.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn extract(html: &str) -> Extracted {
        HtmlExtractor::new(true).extract(html, &base_url())
    }

    fn link_strings(extracted: &Extracted) -> Vec<String> {
        extracted.links.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_extract_title() {
        let parsed = extract("<html><head><title>  Test Page  </title></head><body></body></html>");
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_title_falls_back_to_og_title() {
        let parsed = extract(
            r#"<html><head><meta property="og:title" content="OG Title"></head><body></body></html>"#,
        );
        assert_eq!(parsed.title, Some("OG Title".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = extract("<html><head></head><body></body></html>");
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_description_and_keywords() {
        let parsed = extract(
            r#"<html><head>
                <meta name="description" content="A page">
                <meta name="keywords" content="rust, crawler , ,web">
            </head><body></body></html>"#,
        );
        assert_eq!(parsed.description, Some("A page".to_string()));
        assert_eq!(parsed.keywords, vec!["rust", "crawler", "web"]);
    }

    #[test]
    fn test_description_falls_back_to_og() {
        let parsed = extract(
            r#"<html><head><meta property="og:description" content="From OG"></head></html>"#,
        );
        assert_eq!(parsed.description, Some("From OG".to_string()));
    }

    #[test]
    fn test_text_structure() {
        let parsed = extract(
            r#"<html><body>
                <h2>Section</h2>
                <p>First   paragraph
                   continues.</p>
                <ul><li>One</li><li>Two</li></ul>
                <blockquote><p>Quoted</p></blockquote>
            </body></html>"#,
        );
        assert_eq!(
            parsed.text,
            "## Section\n\nFirst paragraph continues.\n\n- One\n\n- Two\n\n> Quoted"
        );
    }

    #[test]
    fn test_text_skips_boilerplate() {
        let parsed = extract(
            r#"<html><body>
                <header><p>Site header</p></header>
                <nav><ul><li>Home</li></ul></nav>
                <p>Content</p>
                <aside><p>Sidebar</p></aside>
                <footer><p>Copyright</p></footer>
                <script>var x = "<p>nope</p>";</script>
            </body></html>"#,
        );
        assert_eq!(parsed.text, "Content");
    }

    #[test]
    fn test_text_prefers_main() {
        let parsed = extract(
            r#"<html><body><p>Outside</p><main><p>Inside</p></main></body></html>"#,
        );
        assert_eq!(parsed.text, "Inside");
    }

    #[test]
    fn test_code_block_with_language() {
        let parsed = extract(
            "<html><body><pre><code class=\"language-rust\">fn main() {}\n</code></pre></body></html>",
        );
        assert_eq!(parsed.text, "```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_empty_document() {
        let parsed = extract("");
        assert_eq!(parsed.text, "");
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_extract_relative_and_absolute_links() {
        let parsed = extract(
            r#"<html><body>
                <a href="/other">Link</a>
                <a href="sibling">Link</a>
                <a href="https://other.com/page">Link</a>
            </body></html>"#,
        );
        assert_eq!(
            link_strings(&parsed),
            vec![
                "https://example.com/other",
                "https://example.com/sibling",
                "https://other.com/page"
            ]
        );
    }

    #[test]
    fn test_links_deduplicated() {
        let parsed = extract(
            r#"<html><body><a href="/a">1</a><a href="/a">2</a><a href="https://example.com/a">3</a></body></html>"#,
        );
        assert_eq!(link_strings(&parsed), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_skip_special_links() {
        let parsed = extract(
            r##"<html><body>
                <a href="javascript:void(0)">js</a>
                <a href="mailto:test@example.com">mail</a>
                <a href="tel:+1234567890">tel</a>
                <a href="data:text/html,<h1>x</h1>">data</a>
                <a href="#section">jump</a>
                <a href="/file.pdf" download>dl</a>
                <a href="ftp://example.com/x">ftp</a>
            </body></html>"##,
        );
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_follow_nofollow_links() {
        let parsed = extract(r#"<html><body><a href="/page2" rel="nofollow">Link</a></body></html>"#);
        assert_eq!(link_strings(&parsed), vec!["https://example.com/page2"]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let parsed = extract(
            r#"<html><head><link rel="canonical" href="https://example.com/canonical" /></head><body></body></html>"#,
        );
        assert!(link_strings(&parsed).contains(&"https://example.com/canonical".to_string()));
    }

    #[test]
    fn test_extract_images() {
        let parsed = extract(
            r#"<html><body><img src="/a.png"><img src="/a.png"><img src="https://cdn.example.com/b.jpg"></body></html>"#,
        );
        let images: Vec<String> = parsed.images.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            images,
            vec!["https://example.com/a.png", "https://cdn.example.com/b.jpg"]
        );
    }

    #[test]
    fn test_images_disabled() {
        let parsed = HtmlExtractor::new(false).extract(
            r#"<html><body><img src="/a.png"></body></html>"#,
            &base_url(),
        );
        assert!(parsed.images.is_empty());
    }
}
