// src/main.rs
// =============================================================================
// Entry point of the crawler.
//
// What happens here:
// 1. Parse command-line arguments and build the run configuration
// 2. Set up logging, the frontier, the fetcher and the output files
// 3. Run the worker pool until the frontier is exhausted or Ctrl-C
// 4. Print a summary and exit (0 = ran, 2 = could not start)
//
// Everything persistent lives in the output directory, so running the same
// command again resumes the crawl.
// =============================================================================

mod cli;
mod config;
mod engine;
mod error;
mod extract;
mod fetch;
mod frontier;
mod logging;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cli::Cli;
use config::{FrontierSettings, SpiderConfig};
use engine::{RunSummary, WorkerContext, WorkerPool};
use fetch::{HttpFetcher, ProxyPool};
use frontier::{Frontier, LinkFrontier, SequentialFrontier};
use store::{CheckpointStore, OutputSink};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = cli.to_config()?;
    let common = cli.common();

    std::fs::create_dir_all(config.layout.root()).with_context(|| {
        format!(
            "cannot create output directory {}",
            config.layout.root().display()
        )
    })?;

    let log_file = common.log.then(|| config.layout.log_file());
    logging::init(common.verbose, log_file.as_deref())?;

    info!(
        site = config.site.name(),
        namespace = config.layout.namespace(),
        workers = config.workers,
        "starting crawl"
    );

    let cancel = CancellationToken::new();
    let frontier = open_frontier(&config).await?;

    let mut fetcher = HttpFetcher::new()?;
    if let Some(proxy) = &config.proxy {
        let pool = Arc::new(ProxyPool::new(&proxy.list_file));
        Arc::clone(&pool).spawn_refresh(proxy.refresh_every, cancel.clone());
        fetcher = fetcher.with_proxies(pool);
    }

    let output = OutputSink::open(&config.layout, config.outputs)
        .await
        .context("cannot open output files")?;

    let extractor = extract::for_site(config.site, &config.site_arg);
    info!(extractor = extractor.site(), proxy = config.proxy.is_some(), "crawler ready");

    let ctx = WorkerContext {
        fetcher: Arc::new(fetcher),
        extractor,
        frontier,
        output: Arc::new(output),
    };

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after the current items");
            ctrl_c.cancel();
        }
    });

    let summary = WorkerPool::new(ctx, config.workers, config.backoff)
        .run(cancel.clone())
        .await;
    // Stops the proxy refresher if the run ended on its own
    cancel.cancel();

    print_summary(&summary, common.json)?;
    Ok(0)
}

async fn open_frontier(config: &SpiderConfig) -> Result<Arc<dyn Frontier>> {
    let layout = &config.layout;
    let frontier: Arc<dyn Frontier> = match &config.frontier {
        FrontierSettings::Sequential(settings) => {
            let checkpoint = CheckpointStore::new(layout.checkpoint_file());
            // Fail at startup on a corrupt checkpoint rather than in a worker
            checkpoint
                .load_or_init(settings.start)
                .await
                .context("cannot read checkpoint")?;
            Arc::new(SequentialFrontier::new(
                &config.site_arg,
                settings.template.clone(),
                settings.start,
                settings.batch,
                checkpoint,
            ))
        }
        FrontierSettings::Link { seeds } => Arc::new(
            LinkFrontier::open(
                seeds.clone(),
                layout.links_base_file(),
                layout.crawled_links_file(),
            )
            .await
            .context("cannot open link logs")?,
        ),
    };
    Ok(frontier)
}

// Prints the run summary either as a table or JSON
fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{:<20} {:>12}", "ITEMS", "COUNT");
    println!("{}", "=".repeat(33));
    let rows = [
        ("issued", summary.issued),
        ("saved", summary.saved),
        ("pages saved", summary.pages),
        ("fetch failed", summary.fetch_failed),
        ("terminal state", summary.terminal),
        ("missing title", summary.missing_title),
        ("no content", summary.no_content),
        ("failed", summary.failed),
    ];
    for (label, count) in rows {
        println!("{:<20} {:>12}", label, count);
    }
    println!();
    println!("📊 Summary:");
    println!("   ✅ Saved: {}", summary.saved);
    println!("   ⏭️  Skipped: {}", summary.skipped());
    println!("   ❌ Failed: {}", summary.failed);
    Ok(())
}
