//! Query Fetcher
//!
//! One function per query kind. Each builds the remote request, consults the
//! shared cache where the kind is cacheable, and normalizes the answer into
//! a `ResultPage` whose `has_more` follows from the requested window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::params::{
    artist_search_request, discovery_request, top_rated_batch_size, top_rated_key,
    top_rated_request, SongQuery, SongSort,
};
use crate::api::transport::Transport;
use crate::cache::{get_or_fetch, SharedCache, TtlCache, DEFAULT_TTL};
use crate::catalog::VOCALISTS;
use crate::error::{ApiError, Result};
use crate::models::{ArtistSummary, PageRequest, ResultPage, Track};

/// Shortest free-text term the search endpoints accept
pub const MIN_SEARCH_LEN: usize = 2;
/// Results per producer search when the caller has no preference
pub const DEFAULT_ARTIST_SEARCH_LIMIT: usize = 10;

// == Song Batch ==
/// What the cache holds for a song query: a run of items and the total the
/// server reported for the whole result set.
#[derive(Debug, Clone, PartialEq)]
pub struct SongBatch {
    pub items: Vec<Track>,
    pub total_count: usize,
}

/// `{ items, totalCount? }` as returned by the listing endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagedEnvelope<T> {
    items: Vec<T>,
    #[serde(default)]
    total_count: Option<usize>,
}

/// Decodes a listing body. A missing `totalCount` means the page is all
/// there is from `start` on.
fn parse_listing<T: DeserializeOwned>(body: Value, start: usize) -> Result<(Vec<T>, usize)> {
    let envelope: PagedEnvelope<T> = serde_json::from_value(body)?;
    let held = start + envelope.items.len();
    let total_count = envelope.total_count.map_or(held, |total| total.max(held));
    Ok((envelope.items, total_count))
}

// == Settings ==
/// Request and caching defaults applied to every query.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// `languagePreference` sent with every request
    pub language: String,
    /// Lifetime of cached batches
    pub cache_ttl: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            language: "Romaji".to_string(),
            cache_ttl: DEFAULT_TTL,
        }
    }
}

// == Discovery ==
/// Knobs for discovery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Songs fetched before shuffling
    pub pool_size: usize,
    /// Songs returned after shuffling
    pub display: usize,
    pub min_score: u32,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            pool_size: 50,
            display: 10,
            min_score: 3,
        }
    }
}

/// A shuffled handful of one vocalist's well-rated songs.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub vocalist: &'static str,
    pub vocalist_id: u64,
    pub items: Vec<Track>,
}

// == Fetcher ==
/// Per-kind query functions over an injected transport and cache.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    cache: SharedCache<SongBatch>,
    settings: FetchSettings,
    /// Largest top-rated batch stored per (language, hours)
    top_rated_batches: Mutex<HashMap<(String, u32), usize>>,
}

impl Fetcher {
    /// Creates a fetcher with its own cache.
    pub fn new(transport: Arc<dyn Transport>, settings: FetchSettings) -> Self {
        let cache = TtlCache::new(settings.cache_ttl).into_shared();
        Self::with_cache(transport, cache, settings)
    }

    /// Creates a fetcher over an existing cache instance.
    pub fn with_cache(
        transport: Arc<dyn Transport>,
        cache: SharedCache<SongBatch>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            transport,
            cache,
            settings,
            top_rated_batches: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &SharedCache<SongBatch> {
        &self.cache
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    // == Dispatch ==
    /// Fetches one page of any song query.
    pub async fn fetch_page(&self, query: &SongQuery, request: PageRequest) -> Result<ResultPage<Track>> {
        match query {
            SongQuery::TopRated { hours } => self.top_rated(*hours, request).await,
            SongQuery::Search { term, .. } => {
                validate_term(term)?;
                self.fetch_listing(query, request).await
            }
            _ => self.fetch_listing(query, request).await,
        }
    }

    // == Top Rated ==
    /// Most popular songs of the last `hours`.
    ///
    /// The endpoint has no offset, so a batch of `max(100, start + limit)`
    /// is fetched from the top and sliced here. Any window that fits inside
    /// the largest batch still cached is answered without a request; a
    /// window past it fetches a strictly larger batch.
    pub async fn top_rated(&self, hours: u32, request: PageRequest) -> Result<ResultPage<Track>> {
        request.validate()?;

        let language = self.settings.language.as_str();
        let batch_size = top_rated_batch_size(request);

        if let Some(batch) = self.covering_top_rated_batch(language, hours, batch_size).await {
            return Ok(ResultPage::slice(&batch.items, batch.total_count, request));
        }

        let key = top_rated_key(language, hours, batch_size);
        let remote = top_rated_request(language, hours, batch_size);
        let transport = &self.transport;

        let batch = get_or_fetch(&self.cache, &key, self.settings.cache_ttl, move || async move {
            let body = transport.get_json(&remote).await?;
            let items: Vec<Track> = serde_json::from_value(body)?;
            // A full batch says nothing about what lies past it; report one
            // more than held so the next window triggers a larger batch.
            let total_count = if items.len() >= batch_size {
                items.len() + 1
            } else {
                items.len()
            };
            info!(hours, batch_size, received = items.len(), "fetched top-rated batch");
            Ok::<_, ApiError>(SongBatch { items, total_count })
        })
        .await?;

        // Reached only when no larger batch is held, so this one becomes the largest.
        self.top_rated_batches
            .lock()
            .await
            .insert((language.to_string(), hours), batch_size);

        Ok(ResultPage::slice(&batch.items, batch.total_count, request))
    }

    /// The largest cached batch for `(language, hours)` if it holds at least
    /// `needed` items from the top.
    async fn covering_top_rated_batch(&self, language: &str, hours: u32, needed: usize) -> Option<SongBatch> {
        let largest = *self
            .top_rated_batches
            .lock()
            .await
            .get(&(language.to_string(), hours))?;
        if largest < needed {
            return None;
        }

        let batch = self
            .cache
            .write()
            .await
            .get(&top_rated_key(language, hours, largest))?;
        debug!(hours, needed, largest, "top-rated window served from cached batch");
        Some(batch)
    }

    // == Listings ==
    /// Songs crediting an artist.
    pub async fn songs_by_artist(
        &self,
        artist_id: u64,
        sort: SongSort,
        request: PageRequest,
    ) -> Result<ResultPage<Track>> {
        self.fetch_listing(&SongQuery::ByArtist { artist_id, sort }, request)
            .await
    }

    /// Songs carrying a tag (genre).
    pub async fn songs_by_tag(
        &self,
        tag_id: u64,
        sort: SongSort,
        request: PageRequest,
    ) -> Result<ResultPage<Track>> {
        self.fetch_listing(&SongQuery::ByTag { tag_id, sort }, request)
            .await
    }

    /// Songs whose name matches `term`.
    pub async fn search_songs(
        &self,
        term: &str,
        sort: SongSort,
        request: PageRequest,
    ) -> Result<ResultPage<Track>> {
        validate_term(term)?;
        let query = SongQuery::search(term).sorted_by(sort);
        self.fetch_listing(&query, request).await
    }

    async fn fetch_listing(&self, query: &SongQuery, request: PageRequest) -> Result<ResultPage<Track>> {
        request.validate()?;

        let language = self.settings.language.as_str();
        let key = query.page_key(language, request);
        let remote = query.to_request(language, request);
        let transport = &self.transport;

        let batch = get_or_fetch(&self.cache, &key, self.settings.cache_ttl, move || async move {
            let body = transport.get_json(&remote).await?;
            let (items, total_count) = parse_listing::<Track>(body, request.start)?;
            debug!(received = items.len(), total_count, "fetched song page");
            Ok::<_, ApiError>(SongBatch { items, total_count })
        })
        .await?;

        Ok(ResultPage::new(batch.items, batch.total_count, request))
    }

    // == Artist Search ==
    /// Producers whose name matches `term`, most followed first. Not cached.
    pub async fn search_artists(&self, term: &str, request: PageRequest) -> Result<ResultPage<ArtistSummary>> {
        validate_term(term)?;
        request.validate()?;

        let remote = artist_search_request(&self.settings.language, term, request);
        let body = self.transport.get_json(&remote).await?;
        let (items, total_count) = parse_listing::<ArtistSummary>(body, request.start)?;

        Ok(ResultPage::new(items, total_count, request))
    }

    // == Random Discovery ==
    /// Picks a random vocalist and returns a shuffled subset of their
    /// well-rated songs. Never cached; every call draws afresh.
    pub async fn discover(&self, options: DiscoveryOptions) -> Result<Discovery> {
        let mut rng = StdRng::from_rng(&mut rand::rng());
        self.discover_with_rng(options, &mut rng).await
    }

    /// `discover` with a caller-supplied generator.
    pub async fn discover_with_rng(&self, options: DiscoveryOptions, rng: &mut StdRng) -> Result<Discovery> {
        PageRequest::first(options.pool_size).validate()?;

        let &(vocalist, vocalist_id) = VOCALISTS
            .choose(rng)
            .ok_or_else(|| ApiError::InvalidRequest("no discovery candidates".to_string()))?;

        let remote = discovery_request(
            &self.settings.language,
            vocalist_id,
            options.pool_size,
            options.min_score,
        );
        let body = self.transport.get_json(&remote).await?;
        let (mut items, _) = parse_listing::<Track>(body, 0)?;

        items.shuffle(rng);
        items.truncate(options.display);
        info!(vocalist, picked = items.len(), "discovery pool shuffled");

        Ok(Discovery {
            vocalist,
            vocalist_id,
            items,
        })
    }
}

fn validate_term(term: &str) -> Result<()> {
    if term.trim().chars().count() < MIN_SEARCH_LEN {
        return Err(ApiError::InvalidRequest(format!(
            "search term must be at least {} characters",
            MIN_SEARCH_LEN
        )));
    }
    Ok(())
}
