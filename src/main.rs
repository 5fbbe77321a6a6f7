use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use citypulse::catalog;
use citypulse::config::Config;
use citypulse::feed::{FeedEntry, FeedReconciler, Notice, ReconcileError};
use citypulse::news::{ArticleOrigin, NewsClient};
use citypulse::storage::{BookmarkStore, Database, StorageError};
use citypulse::util::{relative_time, truncate_to_width, validate_url_for_open};

const TITLE_WIDTH: usize = 60;

/// Get the config directory path (~/.config/citypulse/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("citypulse"))
}

#[derive(Parser, Debug)]
#[command(name = "citypulse", about = "City news with per-city bookmarks")]
struct Args {
    /// Skip the remote lookup and show sample articles
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List selectable cities
    Cities,
    /// Make CITY the active city
    Select { city: String },
    /// Show the news feed
    Feed {
        #[arg(long)]
        city: Option<String>,
    },
    /// Bookmark (or un-bookmark) a feed article
    ///
    /// ENTRY is an article url or an index into the feed. The feed is fetched
    /// again first, so an index refers to the current order, which may differ
    /// from an earlier `feed` listing; pass the url to be exact.
    Toggle {
        entry: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// List saved articles
    Bookmarks {
        #[arg(long)]
        city: Option<String>,
    },
    /// Remove a saved article by url
    Remove {
        url: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// Open an article in the browser
    Open { url: String },
}

/// Explicit `--city`, else the persisted selection, else the configured default.
async fn resolve_city(
    reconciler: &mut FeedReconciler<NewsClient>,
    explicit: Option<String>,
    config: &Config,
) -> Result<String> {
    let restored = reconciler.startup().await;
    let city = match (explicit, restored) {
        (Some(city), _) => city,
        (None, Some(city)) => return Ok(city),
        (None, None) => config.default_city.clone(),
    };
    match reconciler.select_city(&city).await {
        Ok(()) => {}
        Err(ReconcileError::BlankCity) => anyhow::bail!("City name is blank"),
        // The switch still happened in memory; carry on with a warning
        Err(e) => report_failure(&e),
    }
    Ok(reconciler.active_city().unwrap_or(&city).to_string())
}

fn report_failure(err: &ReconcileError) {
    match err.notice() {
        Some(notice) => eprintln!("{notice}"),
        None => eprintln!("Error: {err}"),
    }
}

/// Print the outcome of a bookmark action; false if it failed.
fn report_outcome(result: Result<Notice, ReconcileError>) -> bool {
    match result {
        Ok(notice) => {
            println!("{notice}");
            true
        }
        Err(e) => {
            report_failure(&e);
            false
        }
    }
}

/// Resolve a `toggle` ENTRY to an article url: numbers index `view`,
/// anything else is taken as the url itself.
fn toggle_target(view: &[FeedEntry], entry: String) -> Result<String> {
    match entry.trim().parse::<usize>() {
        Ok(index) => view
            .get(index)
            .map(|e| e.article.url.clone())
            .with_context(|| format!("No article at index {index}")),
        Err(_) => Ok(entry),
    }
}

fn print_feed(reconciler: &FeedReconciler<NewsClient>, city: &str) {
    let now = Utc::now();
    println!("📍 {} ({} articles)", city, reconciler.view().len());
    if let Some(ArticleOrigin::Fallback { .. }) = reconciler.origin() {
        println!("{}", Notice::SampleData);
    }
    for (i, entry) in reconciler.view().iter().enumerate() {
        let marker = if entry.bookmarked { "♥" } else { " " };
        let article = &entry.article;
        println!(
            "{:>2} {} [{}] {} · {}",
            i,
            marker,
            article.source.as_deref().unwrap_or("News Source"),
            relative_time(article.published_at, now),
            truncate_to_width(&article.title, TITLE_WIDTH)
        );
    }
    if reconciler.view().is_empty() {
        println!("No news available");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    let config = Config::load(&config_dir.join("config.toml")).context("Failed to load config")?;

    if let Command::Open { url } = &args.command {
        let url = validate_url_for_open(url).context("Refusing to open url")?;
        open::that(url.as_str()).with_context(|| format!("Failed to open {url}"))?;
        return Ok(());
    }

    let db_path = config_dir.join("citypulse.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(StorageError::InstanceLocked) => {
            eprintln!("Error: Another instance of citypulse appears to be running. Please close it and try again.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("citypulse/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;
    let mut news = NewsClient::new(http, &config);
    if args.offline {
        news = news.with_api_key(None);
    }

    let mut reconciler = FeedReconciler::new(db.clone(), news);

    let succeeded = match args.command {
        Command::Cities => {
            let store = BookmarkStore::new(db.clone());
            let with_bookmarks = store.cities().await.unwrap_or_default();
            let selected = db.load_selected_city().await;
            for city in catalog::CITIES {
                let active = if selected.as_deref() == Some(city.name) {
                    "*"
                } else {
                    " "
                };
                let saved = if with_bookmarks.iter().any(|c| c == city.name) {
                    " (bookmarks)"
                } else {
                    ""
                };
                println!(
                    "{} {} {} ({}){}",
                    active, city.icon, city.name, city.country, saved
                );
            }
            true
        }
        Command::Select { city } => {
            if catalog::find(&city).is_none() {
                tracing::warn!(city = %city, "City is not in the catalog");
            }
            let name = catalog::find(&city).map_or(city.as_str(), |c| c.name);
            match reconciler.select_city(name).await {
                Ok(()) => {
                    println!("Selected {}", name.trim());
                    true
                }
                Err(e) => {
                    report_failure(&e);
                    false
                }
            }
        }
        Command::Feed { city } => {
            let city = resolve_city(&mut reconciler, city, &config).await?;
            reconciler.refresh().await;
            print_feed(&reconciler, &city);
            true
        }
        Command::Toggle { entry, city } => {
            let city = resolve_city(&mut reconciler, city, &config).await?;
            reconciler.refresh().await;
            let url = toggle_target(reconciler.view(), entry)
                .with_context(|| format!("Nothing to toggle in the {city} feed"))?;
            report_outcome(reconciler.toggle(&url).await)
        }
        Command::Bookmarks { city } => {
            let city = resolve_city(&mut reconciler, city, &config).await?;
            let bookmarks = reconciler.on_view_became_active(&city).await;
            if bookmarks.is_empty() {
                println!("No saved articles. Articles you bookmark in {city} will appear here.");
            }
            for record in bookmarks.iter() {
                println!(
                    "{}\n  {}",
                    truncate_to_width(&record.article.title, TITLE_WIDTH),
                    record.article.url
                );
            }
            true
        }
        Command::Remove { url, city } => {
            resolve_city(&mut reconciler, city, &config).await?;
            report_outcome(reconciler.remove_bookmark(&url).await)
        }
        // Handled before the database is opened
        Command::Open { .. } => true,
    };

    db.close().await;
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
