//! vocastats - browse VocaDB rankings from the terminal
//!
//! Each subcommand opens a session and loads `--pages` pages of it.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocastats::api::fetcher::{DiscoveryOptions, DEFAULT_ARTIST_SEARCH_LIMIT};
use vocastats::cache::TtlCache;
use vocastats::catalog::{self, GENRES, VOCALISTS};
use vocastats::config::Preferences;
use vocastats::{
    ApiError, Config, Fetcher, HttpTransport, PageRequest, Paginator, SongQuery, SongSort, Track,
};

/// Browse VocaDB rankings from the terminal
#[derive(Parser, Debug)]
#[command(name = "vocastats")]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top rated songs of the configured window
    Top {
        /// Window in hours, overrides VOCASTATS_TOP_HOURS
        #[arg(long)]
        hours: Option<u32>,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Songs by a vocalist name or artist id
    Artist {
        name: String,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Songs of a genre
    Genre {
        name: String,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Songs whose title matches a term
    Search {
        term: String,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Producers whose name matches a term
    Producers { term: String },
    /// A shuffled handful of one random vocalist's songs
    Discover,
    /// List known vocalists
    Vocalists,
    /// List known genres
    Genres,
    /// Show or change saved preferences
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print one saved value
    Get { key: String },
    /// Save a value (pageSize, cacheMinutes)
    Set { key: String, value: String },
}

#[derive(clap::Args, Debug)]
struct ListingArgs {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: usize,
    /// rating, favorites, published, added or name
    #[arg(long, default_value = "rating")]
    sort: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with the table
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vocastats=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(hint) = retry_hint(&err) {
                eprintln!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Suggests re-running when the failure was not caused by the input.
fn retry_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<ApiError>()
        .filter(|api_err| api_err.is_retryable())
        .map(|_| "This may be temporary, try again in a moment.")
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load();
    info!(api_url = %config.api_url, page_size = config.page_size, "configuration loaded");

    let transport = HttpTransport::new(config.api_url.clone(), config.timeout())
        .context("failed to build HTTP client")?;
    let mut cache = TtlCache::new(config.cache_ttl());
    if let Some(capacity) = config.cache_capacity() {
        cache = cache.with_capacity(capacity);
    }
    let fetcher = Arc::new(Fetcher::with_cache(
        Arc::new(transport),
        cache.into_shared(),
        config.fetch_settings(),
    ));
    let paginator = Paginator::new(fetcher.clone(), config.page_size);

    match cli.command {
        Command::Top { hours, listing } => {
            let query = SongQuery::top_rated(hours.unwrap_or(config.top_hours));
            browse(&paginator, query, &listing).await?;
        }
        Command::Artist { name, listing } => {
            let artist_id = match catalog::vocalist_id(&name) {
                Some(id) => id,
                None => name
                    .parse()
                    .with_context(|| format!("unknown vocalist '{}'", name))?,
            };
            if let Some(vocalist) = catalog::vocalist_name(artist_id) {
                println!("Songs by {}", vocalist);
            }
            browse(&paginator, SongQuery::by_artist(artist_id), &listing).await?;
        }
        Command::Genre { name, listing } => {
            let Some(tag_id) = catalog::genre_id(&name) else {
                bail!("unknown genre '{}', see `vocastats genres`", name);
            };
            browse(&paginator, SongQuery::by_tag(tag_id), &listing).await?;
        }
        Command::Search { term, listing } => {
            browse(&paginator, SongQuery::search(&term), &listing).await?;
        }
        Command::Producers { term } => {
            let page = fetcher
                .search_artists(&term, PageRequest::first(DEFAULT_ARTIST_SEARCH_LIMIT))
                .await?;
            for artist in &page.items {
                match &artist.additional_names {
                    Some(names) if !names.is_empty() => println!("{:>8}  {} ({})", artist.id, artist.name, names),
                    _ => println!("{:>8}  {}", artist.id, artist.name),
                }
            }
            println!("{} of {} producers", page.len(), page.total_count);
        }
        Command::Discover => {
            let found = fetcher.discover(DiscoveryOptions::default()).await?;
            println!("Discovering {}", found.vocalist);
            print_tracks(&found.items, 0);
        }
        Command::Vocalists => print_table(VOCALISTS),
        Command::Genres => print_table(GENRES),
        Command::Config { action } => preferences(action)?,
    }

    Ok(())
}

fn preferences(action: Option<ConfigAction>) -> anyhow::Result<()> {
    let path = Preferences::default_path().context("cannot locate the home directory")?;
    let mut saved = Preferences::load_from(&path);

    match action {
        None => {
            println!("{}", serde_json::to_string_pretty(&saved)?);
            println!("({})", path.display());
        }
        Some(ConfigAction::Get { key }) => match saved.get(&key) {
            Some(value) => println!("{}", value),
            None => bail!("'{}' is not set", key),
        },
        Some(ConfigAction::Set { key, value }) => {
            saved.set(&key, &value)?;
            saved.save_to(&path)?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

async fn browse(paginator: &Paginator, query: SongQuery, listing: &ListingArgs) -> anyhow::Result<()> {
    let sort: SongSort = listing.sort.parse()?;
    let mut session = paginator.open_session(query.sorted_by(sort)).await?;
    print_tracks(session.items(), 0);

    for _ in 1..listing.pages {
        if !session.has_more() {
            break;
        }
        let offset = session.len();
        let loaded = paginator.load_more(&mut session).await?;
        print_tracks(&loaded.appended, offset);
    }

    let more = if session.has_more() { ", more available" } else { "" };
    println!("{} of {} songs{}", session.len(), session.known_total(), more);
    Ok(())
}

fn print_tracks(tracks: &[Track], offset: usize) {
    for (i, track) in tracks.iter().enumerate() {
        println!(
            "{:>4}. {:<40} {:<24} {:<24} {:>6}  {}",
            offset + i + 1,
            track.display_name(),
            track.producers(),
            track.vocalists().join(", "),
            track.rating_score,
            track.pv_url().unwrap_or("-"),
        );
    }
}

fn print_table(table: &[(&str, u64)]) {
    for (name, id) in table {
        println!("{:>6}  {}", id, name);
    }
}
