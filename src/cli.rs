// src/cli.rs
// =============================================================================
// Command-line interface, one subcommand per site.
//
// Every site takes the same output/worker/logging flags (CommonArgs). The
// sequential-ID sites add a start ID and batch size (SequenceArgs), and
// tianya/news add the board or subdomain that namespaces their state.
//
// Example:
//   site-spider tianya ./data -n 4 -b free --id 5000000 --proxy
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{OutputFlags, ProxyConfig, SiteKind, SpiderConfig};
use crate::error::Result;

const PROXY_REFRESH: Duration = Duration::from_secs(600);

#[derive(Parser, Debug)]
#[command(
    name = "site-spider",
    version = "0.1.0",
    about = "A resumable multi-worker crawler for forums, encyclopedias, news and novels",
    long_about = "site-spider crawls one site profile into an output directory. \
                  All progress is kept next to the output, so stopping and re-running \
                  the same command resumes where it left off."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Baidu Tieba threads by post ID
    Tieba {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        sequence: SequenceArgs,
    },

    /// Tianya forum posts by ID within one board
    Tianya {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        sequence: SequenceArgs,
        /// Forum board
        #[arg(short = 'b', default_value = "free")]
        board: String,
    },

    /// Hupu forum threads by ID
    Hupu {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        sequence: SequenceArgs,
    },

    /// Baidu Baike entries, following links between entries
    Baike {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// 163.com news articles under one channel
    News {
        #[command(flatten)]
        common: CommonArgs,
        /// Channel subdomain, e.g. `sports` for sports.163.com
        #[arg(short = 'p', default_value = "www")]
        prefix: String,
    },

    /// Free novels from 17k.com
    Novel {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Output directory; crawl state is kept here too
    pub output: PathBuf,

    /// Number of workers
    #[arg(short = 'n', default_value_t = 1)]
    pub workers: usize,

    /// Write logs to <output>/log.txt instead of the console
    #[arg(long)]
    pub log: bool,

    /// Fetch through proxies from --proxy-file
    #[arg(long)]
    pub proxy: bool,

    /// Proxy list, one host:port or URL per line, re-read periodically
    #[arg(long = "proxy-file", default_value = "all_proxies.txt")]
    pub proxy_file: PathBuf,

    /// Don't write one file per item
    #[arg(long = "no_small_file")]
    pub no_small_file: bool,

    /// Don't write the aggregate file
    #[arg(long = "no_nondedu_file")]
    pub no_nondedu_file: bool,

    /// Don't write the deduplicated aggregate file
    #[arg(long = "no_dedu_file")]
    pub no_dedu_file: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct SequenceArgs {
    /// First post ID (site default when omitted)
    #[arg(long = "id")]
    pub start: Option<u64>,

    /// IDs reserved per checkpoint advance (site default when omitted)
    #[arg(long)]
    pub batch: Option<u64>,
}

impl Cli {
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Commands::Tieba { common, .. }
            | Commands::Tianya { common, .. }
            | Commands::Hupu { common, .. }
            | Commands::Baike { common }
            | Commands::News { common, .. }
            | Commands::Novel { common } => common,
        }
    }

    pub fn to_config(&self) -> Result<SpiderConfig> {
        let (site, site_arg, sequence) = match &self.command {
            Commands::Tieba { sequence, .. } => (SiteKind::Tieba, "", Some(sequence)),
            Commands::Tianya {
                sequence, board, ..
            } => (SiteKind::Tianya, board.as_str(), Some(sequence)),
            Commands::Hupu { sequence, .. } => (SiteKind::Hupu, "", Some(sequence)),
            Commands::Baike { .. } => (SiteKind::Baike, "", None),
            Commands::News { prefix, .. } => (SiteKind::News, prefix.as_str(), None),
            Commands::Novel { .. } => (SiteKind::Novel, "", None),
        };

        let common = self.common();
        let mut config = SpiderConfig::new(
            site,
            &common.output,
            site_arg,
            sequence.and_then(|s| s.start),
            sequence.and_then(|s| s.batch),
        )?;

        config.workers = common.workers.max(1);
        config.outputs = OutputFlags {
            small_files: !common.no_small_file,
            aggregate: !common.no_nondedu_file,
            deduplicated: !common.no_dedu_file,
        };
        if common.proxy {
            config.proxy = Some(ProxyConfig {
                list_file: common.proxy_file.clone(),
                refresh_every: PROXY_REFRESH,
            });
        }
        Ok(config)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[command(flatten)] do?
//    - Copies the fields of another Args struct into this subcommand
//    - Every site gets the same output/-n/--log flags without repeating them
//
// 2. Why Option<u64> for --id and --batch?
//    - None means "use the site's default"
//    - The defaults live in SiteKind, not in clap, because they differ per site
//
// 3. Why long = "no_small_file" with underscores?
//    - clap would turn no_small_file into --no-small-file by default
//    - We keep the underscore spelling existing crawl scripts already use
// -----------------------------------------------------------------------------
