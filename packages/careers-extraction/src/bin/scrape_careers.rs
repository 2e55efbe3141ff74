// Command line entry point: scrape configured career pages and print the
// listings as JSON on stdout.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use careers_extraction::browsers::{ChromeConfig, ChromeLauncher};
use careers_extraction::probes::HttpProbe;
use careers_extraction::{resolve_sites, EngineConfig, ExtractionEngine, FallbackExtractor, NoFallback, SiteInput};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Settings read from the environment.
#[derive(Debug, Clone)]
struct Config {
    sites_file: PathBuf,
    fetch_limit: usize,
    headful: bool,
}

impl Config {
    fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        Ok(Self {
            sites_file: env::var("CAREERS_SITES_FILE")
                .unwrap_or_else(|_| "sites.json".to_string())
                .into(),
            fetch_limit: env::var("CAREERS_FETCH_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("CAREERS_FETCH_LIMIT must be a valid number")?,
            headful: env::var("CAREERS_HEADFUL")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

fn fallback_from_env() -> Box<dyn FallbackExtractor> {
    #[cfg(feature = "openai")]
    {
        match careers_extraction::ai::OpenAiFallback::from_env() {
            Ok(fallback) => {
                tracing::info!(model = fallback.model(), "Using OpenAI fallback extractor");
                return Box::new(fallback);
            }
            Err(e) => tracing::info!(reason = %e, "OpenAI fallback disabled"),
        }
    }
    Box::new(NoFallback)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the JSON result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,careers_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(sites_file = %config.sites_file.display(), fetch_limit = config.fetch_limit, "Configuration loaded");

    let raw = std::fs::read_to_string(&config.sites_file)
        .with_context(|| format!("Failed to read {}", config.sites_file.display()))?;
    let inputs: Vec<SiteInput> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config.sites_file.display()))?;

    let probe = HttpProbe::new().context("Failed to create HTTP client")?;
    let sites = resolve_sites(&inputs, &probe).await;

    let launcher = ChromeLauncher::new(ChromeConfig::default().with_headless(!config.headful));
    let engine = ExtractionEngine::new(
        launcher,
        fallback_from_env(),
        EngineConfig::default().with_fetch_limit(config.fetch_limit),
    );

    let run = engine.run_with_report(&sites).await;
    for site in run.failed_sites() {
        tracing::warn!(site = %site.source, error = site.error.as_deref().unwrap_or_default(), "Site failed");
    }
    tracing::info!(listings = run.listings.len(), "Done");

    let json = serde_json::to_string_pretty(&run.listings).context("Failed to serialize listings")?;
    println!("{}", json);
    Ok(())
}
