//! # SiteChat CLI (`sitechat`)
//!
//! Train the chatbot on a website or a local directory and ask it
//! questions, or start the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! sitechat --config ./config/sitechat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sitechat discover <url>` | Print the page URLs that would be trained on |
//! | `sitechat scrape <url>` | Crawl and train on a website, then print a summary |
//! | `sitechat train-local <dir>` | Train on the text files under a directory |
//! | `sitechat ask "<question>"` | Train (via `--url`, `--dir`, or the default website) and answer |
//! | `sitechat serve` | Start the HTTP API |
//!
//! The store is in-memory, so `ask` trains in the same process before
//! answering.
//!
//! ## Examples
//!
//! ```bash
//! sitechat discover visafy.com
//! sitechat ask "What do you know about visafy.com?" --url visafy.com
//! sitechat ask "What is in the roadmap?" --dir ./project-plan
//! PORT=8080 sitechat serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitechat::config::{load_config, Config};
use sitechat::connector_fs::train_local_files;
use sitechat::crawler::Crawler;
use sitechat::fetch::Fetcher;
use sitechat::router::QueryRouter;
use sitechat::server::run_server;
use sitechat::site::SiteMatcher;
use sitechat::store::DocumentStore;
use sitechat::trainer::Trainer;

/// SiteChat: a chatbot trained on a website's own pages.
#[derive(Parser)]
#[command(
    name = "sitechat",
    about = "SiteChat: train a chatbot on a website and ask it questions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/sitechat.toml`. A missing file means built-in
    /// defaults. Environment variables (`MAX_URLS`, `DEFAULT_WEBSITE`,
    /// `OPENROUTER_API_KEY`, `PORT`) and a `.env` file are applied on top.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover page URLs for a website without training.
    Discover {
        /// Website URL or bare domain.
        url: String,
    },

    /// Crawl a website and train on its pages.
    Scrape {
        /// Website URL or bare domain.
        url: String,
    },

    /// Train on the text files under a local directory.
    TrainLocal {
        /// Directory to walk recursively.
        dir: PathBuf,
    },

    /// Ask a question.
    ///
    /// Trains first on `--url`, else `--dir`, else the configured default
    /// website. With none of these the store is empty.
    Ask {
        /// The question to answer.
        question: String,

        /// Website to train on before answering.
        #[arg(long)]
        url: Option<String>,

        /// Local directory to train on before answering.
        #[arg(long, conflicts_with = "url")]
        dir: Option<PathBuf>,
    },

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

/// Process-local training pipeline for one CLI invocation.
struct Pipeline {
    config: Config,
    store: Arc<DocumentStore>,
    crawler: Crawler,
    trainer: Trainer,
}

impl Pipeline {
    fn new(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(DocumentStore::with_sites(SiteMatcher::from_config(
            &config.sites.brands,
        )));
        let fetcher = Fetcher::new(&config.crawler)?;
        let crawler = Crawler::from_config(fetcher.clone(), &config.crawler);
        let trainer = Trainer::new(fetcher, &config.training, &config.fallback);
        Ok(Self {
            config,
            store,
            crawler,
            trainer,
        })
    }

    async fn scrape(&self, url: &str) -> anyhow::Result<Vec<String>> {
        self.trainer
            .scrape_website(&self.crawler, &self.store, url)
            .await
    }

    fn train_local(&self, dir: &std::path::Path) -> anyhow::Result<()> {
        let report = train_local_files(&self.store, dir, &self.config)?;
        println!(
            "Trained on {} files ({} skipped), {} chunks.",
            report.files, report.skipped, report.chunks
        );
        Ok(())
    }

    fn router(&self) -> QueryRouter {
        QueryRouter::from_config(self.store.clone(), &self.config)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sitechat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let cfg = load_config(&config_path)?;

    match cli.command {
        Commands::Discover { url } => {
            let crawler = Crawler::from_config(Fetcher::new(&cfg.crawler)?, &cfg.crawler);
            let urls = crawler.discover(&url).await;
            for url in &urls {
                println!("{}", url);
            }
            println!("Found {} URLs (max {}).", urls.len(), crawler.max_urls());
        }
        Commands::Scrape { url } => {
            let pipeline = Pipeline::new(cfg)?;
            let urls = pipeline.scrape(&url).await?;
            println!(
                "Trained on {} URLs, {} chunks.",
                urls.len(),
                pipeline.store.len()
            );
            for site in pipeline.store.get_websites() {
                println!("  {}", site);
            }
        }
        Commands::TrainLocal { dir } => {
            let pipeline = Pipeline::new(cfg)?;
            pipeline.train_local(&dir)?;
            for site in pipeline.store.get_websites() {
                println!("  {}", site);
            }
        }
        Commands::Ask { question, url, dir } => {
            let default_website = cfg.training.default_website.clone();
            let pipeline = Pipeline::new(cfg)?;

            if let Some(url) = url.or(default_website).filter(|_| dir.is_none()) {
                pipeline.scrape(&url).await?;
            } else if let Some(dir) = dir {
                pipeline.train_local(&dir)?;
            }

            let answer = pipeline.router().ask(&question).await;
            println!("{}", answer);
        }
        Commands::Serve => {
            run_server(&cfg).await?;
        }
    }

    Ok(())
}
