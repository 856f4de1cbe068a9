use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default user agent, identifying the crawler to the sites it visits
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; SumiCrawl/1.0)";

/// Main configuration structure for Sumi-Crawl
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with default settings for the given seed URL
    pub fn for_seed(start_url: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig::new(start_url),
            politeness: PolitenessConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Validates every section of the configuration
    pub fn validate(&self) -> crate::ConfigResult<()> {
        crate::config::validation::validate(self)
    }

    /// SHA-256 of the configuration as canonical TOML
    ///
    /// Used as the config hash of runs started without a config file.
    pub fn fingerprint(&self) -> crate::ConfigResult<String> {
        let canonical = toml::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Crawl scope and budget configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Seed URL the crawl starts from
    pub start_url: String,

    /// Maximum number of URLs to attempt
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum link depth from the seed (the seed is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Only follow links within the seed's registrable domain
    #[serde(default = "default_true")]
    pub same_domain: bool,

    /// Number of concurrent workers
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Skip pages whose extracted text was already seen
    #[serde(default = "default_true")]
    pub deduplicate: bool,

    /// Follow links discovered on crawled pages
    #[serde(default = "default_true")]
    pub extract_links: bool,

    /// Collect image URLs from crawled pages
    #[serde(default)]
    pub extract_images: bool,
}

impl CrawlerConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            same_domain: true,
            max_concurrent: default_max_concurrent(),
            deduplicate: true,
            extract_links: true,
            extract_images: false,
        }
    }
}

/// Rate limiting and robots.txt behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PolitenessConfig {
    /// Base delay between requests to the same domain (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Ceiling for the backed-off per-domain delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consult robots.txt before fetching
    #[serde(default = "default_true")]
    pub respect_robots: bool,
}

impl PolitenessConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            respect_robots: true,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header sent with every request and matched against robots.txt
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per URL before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential retry sleep (milliseconds); attempt n sleeps base * 2^n
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Follow HTTP redirects
    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            follow_redirects: true,
            headers: BTreeMap::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database receiving page results
    pub database_path: Option<String>,

    /// Path to the markdown summary file
    pub summary_path: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    100
}

fn default_max_depth() -> u32 {
    3
}

fn default_max_concurrent() -> u32 {
    10
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}
