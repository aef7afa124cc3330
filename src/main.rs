//! SEO Analyzer main entry point
//!
//! Serves the HTTP API by default; `--topic/--audience` runs one analysis and
//! prints the report, `--dry-run` only validates the configuration.

use anyhow::Context;
use clap::Parser;
use seo_analyzer::config::{load_config_with_hash, Config};
use seo_analyzer::model::{AnalysisOptions, AnalysisRequest};
use seo_analyzer::pipeline::Pipeline;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SEO Analyzer: topic research reports from live search results
///
/// Searches a topic, fetches the top-ranking pages under a concurrency
/// ceiling, and asks a language model for an SEO analysis aimed at the given
/// audience.
#[derive(Parser, Debug)]
#[command(name = "seo-analyzer")]
#[command(version)]
#[command(about = "Topic research reports from live search results", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print the effective settings without serving
    #[arg(long, conflicts_with = "topic")]
    dry_run: bool,

    /// Run a single analysis for this topic and exit
    #[arg(long, requires = "audience")]
    topic: Option<String>,

    /// Target audience for --topic
    #[arg(long, requires = "topic")]
    audience: Option<String>,

    /// Ask for a first content draft (--topic mode)
    #[arg(long)]
    draft: bool,

    /// Ask for FAQ suggestions (--topic mode)
    #[arg(long)]
    faq: bool,

    /// Ask for a comparison table (--topic mode)
    #[arg(long)]
    table: bool,

    /// Print the full report as JSON instead of Markdown (--topic mode)
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let pipeline = Pipeline::from_config(&config).context("failed to build pipeline")?;

    match (&cli.topic, &cli.audience) {
        (Some(topic), Some(audience)) => {
            let options = AnalysisOptions {
                generate_draft: cli.draft,
                include_faq: cli.faq,
                include_table: cli.table,
            };
            run_once(&pipeline, topic, audience, options, cli.json).await
        }
        _ => {
            seo_analyzer::server::serve(&config, pipeline).await?;
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_analyzer=info,warn"),
            1 => EnvFilter::new("seo_analyzer=debug,info"),
            2 => EnvFilter::new("seo_analyzer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_once(
    pipeline: &Pipeline,
    topic: &str,
    audience: &str,
    options: AnalysisOptions,
    as_json: bool,
) -> anyhow::Result<()> {
    let request = AnalysisRequest::new(topic, audience, options)?;
    let report = pipeline.run(&request).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.report_text);
        eprintln!(
            "\n{} of {} pages fetched, {} usage units, {:.1}s{}",
            report.fetch.successful,
            report.fetch.total,
            report.usage_units,
            report.total_elapsed_seconds,
            if report.cached { " (cached)" } else { "" }
        );
    }

    Ok(())
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}

fn print_dry_run(config: &Config) {
    println!("=== SEO Analyzer Dry Run ===\n");

    println!("Server:");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!("  CORS origins: {}", config.server.cors_origins.join(", "));

    println!("\nSearch:");
    println!("  Endpoint: {}", config.search.base_url);
    println!("  API key: {}", mask(&config.search.api_key));
    println!(
        "  Engine: {} ({}, {})",
        config.search.engine, config.search.location, config.search.language
    );
    println!("  Results per search: {}", config.search.result_count);

    println!("\nFetch:");
    println!("  Max concurrent: {}", config.fetch.max_concurrent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Attempts: {}", config.fetch.max_attempts);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nAnalysis:");
    println!("  Endpoint: {}", config.analysis.endpoint);
    println!("  API key: {}", mask(&config.analysis.api_key));
    match &config.analysis.api_version {
        Some(version) => println!("  Deployment: {} (api-version {})", config.analysis.model, version),
        None => println!("  Model: {}", config.analysis.model),
    }
    println!("  Max tokens: {}", config.analysis.max_tokens);
    println!("  Input ceiling: {} units", config.analysis.input_ceiling);

    println!("\nPipeline:");
    println!("  Budget: {}s", config.pipeline.budget_secs);
    println!(
        "  Thresholds: search {}s, fetch {}s, analyze {}s, total {}s",
        config.pipeline.search_threshold_secs,
        config.pipeline.fetch_threshold_secs,
        config.pipeline.analyze_threshold_secs,
        config.pipeline.total_threshold_secs
    );

    println!("\nJobs:");
    println!("  Retention: {}h", config.jobs.retention_hours);

    println!("\nCache:");
    if config.cache.enabled {
        println!("  Database: {}", config.cache.database_path);
        println!("  TTL: {}s", config.cache.ttl_secs);
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");
}
