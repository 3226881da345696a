// src/config.rs
// =============================================================================
// Validated run configuration, built from the parsed CLI.
//
// SiteKind carries the per-site constants (URL templates, default start ID,
// batch size, seeds). StateLayout turns an output directory and a namespace
// into every path the crawler reads or writes, so the file naming lives in
// one place.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

use crate::error::{Result, SpiderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFlags {
    /// One `<id>_<title>.txt` per item
    pub small_files: bool,
    /// Every item appended to `<ns>_all.txt`
    pub aggregate: bool,
    /// Each distinct text appended once to `<ns>_dedu.txt`
    pub deduplicated: bool,
}

impl Default for OutputFlags {
    fn default() -> Self {
        Self {
            small_files: true,
            aggregate: true,
            deduplicated: true,
        }
    }
}

/// Sleep window used when the frontier is empty: `base + rand(0..=jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: Duration,
}

impl Backoff {
    pub const SEQUENTIAL: Backoff = Backoff {
        base: Duration::from_secs(1),
        jitter: Duration::from_secs(1),
    };

    // Link refills re-read the whole link base, so wait longer between them
    pub const LINK: Backoff = Backoff {
        base: Duration::from_secs(20),
        jitter: Duration::from_secs(20),
    };

    pub fn sample(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.base + Duration::from_millis(extra)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub list_file: PathBuf,
    pub refresh_every: Duration,
}

/// Where an ID goes in a Sequential-ID URL: `{ns}` is the namespace (board),
/// `{id}` the sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains("{id}") {
            return Err(SpiderError::InvalidTemplate(template));
        }
        Ok(Self(template))
    }

    pub fn render(&self, namespace: &str, id: u64) -> String {
        self.0
            .replace("{ns}", namespace)
            .replace("{id}", &id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialSettings {
    pub template: UrlTemplate,
    pub start: u64,
    pub batch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontierSettings {
    Sequential(SequentialSettings),
    Link { seeds: Vec<String> },
}

/// Which site we crawl and how its work items are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Tieba,
    Tianya,
    Hupu,
    Baike,
    News,
    Novel,
}

impl SiteKind {
    pub fn name(&self) -> &'static str {
        match self {
            SiteKind::Tieba => "tieba",
            SiteKind::Tianya => "tianya",
            SiteKind::Hupu => "hupu",
            SiteKind::Baike => "baike",
            SiteKind::News => "news",
            SiteKind::Novel => "novel",
        }
    }

    pub fn default_start(&self) -> u64 {
        match self {
            SiteKind::Tieba => 5_000_000_000,
            SiteKind::Tianya => 5_000_000,
            _ => 0,
        }
    }

    pub fn default_batch(&self) -> u64 {
        match self {
            SiteKind::Tianya => 1000,
            _ => 10_000,
        }
    }

    pub fn template(&self) -> Option<&'static str> {
        match self {
            SiteKind::Tieba => Some("https://tieba.baidu.com/p/{id}"),
            SiteKind::Tianya => Some("http://bbs.tianya.cn/post-{ns}-{id}-1.shtml"),
            SiteKind::Hupu => Some("https://bbs.hupu.com/{id}.html"),
            _ => None,
        }
    }

    pub fn seeds(&self, namespace: &str) -> Vec<String> {
        match self {
            SiteKind::Baike => vec!["https://baike.baidu.com".to_string()],
            SiteKind::News => vec![format!("http://{}.163.com/", namespace)],
            SiteKind::Novel => (1..=50)
                .map(|page| {
                    format!(
                        "http://all.17k.com/lib/book/2_14_0_0_0_1_1_0_{}.html",
                        page
                    )
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn backoff(&self) -> Backoff {
        if self.template().is_some() {
            Backoff::SEQUENTIAL
        } else {
            Backoff::LINK
        }
    }
}

/// Every path the crawler touches, derived from the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
    namespace: String,
}

impl StateLayout {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn checkpoint_file(&self) -> PathBuf {
        self.root.join(format!("temp_{}_ID.txt", self.namespace))
    }

    pub fn links_base_file(&self) -> PathBuf {
        self.root
            .join(format!("temp_{}_links_base.txt", self.namespace))
    }

    pub fn crawled_links_file(&self) -> PathBuf {
        self.root
            .join(format!("temp_{}_crawled_links.txt", self.namespace))
    }

    pub fn items_dir(&self) -> PathBuf {
        self.root.join(format!("{}_output", self.namespace))
    }

    pub fn aggregate_file(&self) -> PathBuf {
        self.root.join(format!("{}_all.txt", self.namespace))
    }

    pub fn dedup_file(&self) -> PathBuf {
        self.root.join(format!("{}_dedu.txt", self.namespace))
    }

    pub fn dedup_fingerprints(&self) -> PathBuf {
        self.root
            .join(format!("{}_dedu.fingerprints", self.namespace))
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("log.txt")
    }
}

#[derive(Debug, Clone)]
pub struct SpiderConfig {
    pub site: SiteKind,
    /// Board (tianya) or subdomain prefix (news); empty for the other sites
    pub site_arg: String,
    pub workers: usize,
    pub outputs: OutputFlags,
    pub backoff: Backoff,
    pub frontier: FrontierSettings,
    pub proxy: Option<ProxyConfig>,
    pub layout: StateLayout,
}

impl SpiderConfig {
    /// Builds the configuration for `site`, filling in site defaults for
    /// anything the caller left unset.
    pub fn new(
        site: SiteKind,
        output: impl Into<PathBuf>,
        site_arg: impl Into<String>,
        start: Option<u64>,
        batch: Option<u64>,
    ) -> Result<Self> {
        let site_arg = site_arg.into();
        let namespace = if site_arg.is_empty() {
            site.name().to_string()
        } else {
            format!("{}_{}", site.name(), site_arg)
        };

        let frontier = match site.template() {
            Some(template) => FrontierSettings::Sequential(SequentialSettings {
                template: UrlTemplate::new(template)?,
                start: start.unwrap_or_else(|| site.default_start()),
                batch: batch.unwrap_or_else(|| site.default_batch()).max(1),
            }),
            None => FrontierSettings::Link {
                seeds: site.seeds(&site_arg),
            },
        };

        Ok(Self {
            site,
            site_arg,
            workers: 1,
            outputs: OutputFlags::default(),
            backoff: site.backoff(),
            frontier,
            proxy: None,
            layout: StateLayout::new(output, namespace),
        })
    }
}
