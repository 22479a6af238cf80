//! Query kinds, request parameters and cache keys
//!
//! Every remote request is described by a `RemoteRequest`; every cacheable
//! query by a key of the form `<kind>:<language>:<param>:...`. Only values
//! that change the remote answer go into a key.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::models::PageRequest;

/// Songs endpoint
pub const SONGS_PATH: &str = "songs";
/// Most-popular-in-window endpoint; takes no start offset
pub const TOP_RATED_PATH: &str = "songs/top-rated";
/// Artists endpoint
pub const ARTISTS_PATH: &str = "artists";

/// Related fields requested with every song
pub const SONG_FIELDS: &str = "Artists,ThumbUrl,PVs";
/// Smallest batch fetched from the top-rated endpoint
pub const MIN_TOP_RATED_BATCH: usize = 100;
/// Top-rated window used when none is configured (one week)
pub const DEFAULT_TOP_HOURS: u32 = 168;

// == Remote Request ==
/// A GET against the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
}

impl RemoteRequest {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            query: Vec::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    /// Value of the first parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

// == Song Sort ==
/// Server-side ordering for song listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SongSort {
    #[default]
    RatingScore,
    FavoritedTimes,
    PublishDate,
    AdditionDate,
    Name,
}

impl SongSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            SongSort::RatingScore => "RatingScore",
            SongSort::FavoritedTimes => "FavoritedTimes",
            SongSort::PublishDate => "PublishDate",
            SongSort::AdditionDate => "AdditionDate",
            SongSort::Name => "Name",
        }
    }
}

impl fmt::Display for SongSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongSort {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ratingscore" | "rating" => Ok(SongSort::RatingScore),
            "favoritedtimes" | "favorites" => Ok(SongSort::FavoritedTimes),
            "publishdate" | "published" => Ok(SongSort::PublishDate),
            "additiondate" | "added" => Ok(SongSort::AdditionDate),
            "name" => Ok(SongSort::Name),
            _ => Err(ApiError::InvalidRequest(format!("unknown sort order: {}", s))),
        }
    }
}

// == Song Query ==
/// A paginated song listing the coordinator can open a session on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SongQuery {
    TopRated { hours: u32 },
    ByArtist { artist_id: u64, sort: SongSort },
    ByTag { tag_id: u64, sort: SongSort },
    Search { term: String, sort: SongSort },
}

impl SongQuery {
    pub fn top_rated(hours: u32) -> Self {
        SongQuery::TopRated { hours }
    }

    pub fn by_artist(artist_id: u64) -> Self {
        SongQuery::ByArtist {
            artist_id,
            sort: SongSort::default(),
        }
    }

    pub fn by_tag(tag_id: u64) -> Self {
        SongQuery::ByTag {
            tag_id,
            sort: SongSort::default(),
        }
    }

    /// Text search; surrounding whitespace never reaches the server.
    pub fn search(term: &str) -> Self {
        SongQuery::Search {
            term: term.trim().to_string(),
            sort: SongSort::default(),
        }
    }

    /// Replaces the sort order. Top-rated has a fixed order and ignores it.
    pub fn sorted_by(self, sort: SongSort) -> Self {
        match self {
            SongQuery::TopRated { hours } => SongQuery::TopRated { hours },
            SongQuery::ByArtist { artist_id, .. } => SongQuery::ByArtist { artist_id, sort },
            SongQuery::ByTag { tag_id, .. } => SongQuery::ByTag { tag_id, sort },
            SongQuery::Search { term, .. } => SongQuery::Search { term, sort },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SongQuery::TopRated { .. } => "top-rated",
            SongQuery::ByArtist { .. } => "artist",
            SongQuery::ByTag { .. } => "tag",
            SongQuery::Search { .. } => "search",
        }
    }

    // == Cache Key ==
    /// Fingerprint of one page of an offset-paginated query.
    ///
    /// The free-text term goes last so that a term containing `:` cannot
    /// collide with another key.
    pub fn page_key(&self, language: &str, request: PageRequest) -> String {
        let PageRequest { start, limit } = request;
        match self {
            SongQuery::TopRated { hours } => {
                top_rated_key(language, *hours, top_rated_batch_size(request))
            }
            SongQuery::ByArtist { artist_id, sort } => {
                format!("artist:{language}:{artist_id}:{sort}:{start}:{limit}")
            }
            SongQuery::ByTag { tag_id, sort } => {
                format!("tag:{language}:{tag_id}:{sort}:{start}:{limit}")
            }
            SongQuery::Search { term, sort } => {
                format!("search:{language}:{sort}:{start}:{limit}:{term}")
            }
        }
    }

    // == Remote Request ==
    /// Builds the request for one page of an offset-paginated query.
    ///
    /// For top-rated this is the whole batch from offset 0.
    pub fn to_request(&self, language: &str, request: PageRequest) -> RemoteRequest {
        match self {
            SongQuery::TopRated { hours } => {
                top_rated_request(language, *hours, top_rated_batch_size(request))
            }
            SongQuery::ByArtist { artist_id, sort } => {
                song_listing(language, *sort, request).param("artistId", artist_id)
            }
            SongQuery::ByTag { tag_id, sort } => {
                song_listing(language, *sort, request).param("tagId", tag_id)
            }
            SongQuery::Search { term, sort } => {
                song_listing(language, *sort, request).param("query", term)
            }
        }
    }
}

// == Top Rated ==
/// Size of the batch that has to be fetched from offset 0 to answer `request`.
pub fn top_rated_batch_size(request: PageRequest) -> usize {
    request.end().max(MIN_TOP_RATED_BATCH)
}

pub fn top_rated_key(language: &str, hours: u32, batch_size: usize) -> String {
    format!("top-rated:{language}:{hours}:{batch_size}")
}

pub fn top_rated_request(language: &str, hours: u32, batch_size: usize) -> RemoteRequest {
    RemoteRequest::new(TOP_RATED_PATH)
        .param("durationHours", hours)
        .param("filterBy", "PublishDate")
        .param("languagePreference", language)
        .param("fields", SONG_FIELDS)
        .param("maxResults", batch_size)
}

// == Shared Builders ==
/// Parameters common to every playable song listing.
pub fn song_listing(language: &str, sort: SongSort, request: PageRequest) -> RemoteRequest {
    RemoteRequest::new(SONGS_PATH)
        .param("sort", sort)
        .param("languagePreference", language)
        .param("fields", SONG_FIELDS)
        .param("onlyWithPvs", true)
        .param("getTotalCount", true)
        .param("start", request.start)
        .param("maxResults", request.limit)
}

/// Producer search ordered by follower count.
pub fn artist_search_request(language: &str, term: &str, request: PageRequest) -> RemoteRequest {
    RemoteRequest::new(ARTISTS_PATH)
        .param("query", term.trim())
        .param("artistTypes", "Producer")
        .param("sort", "FollowerCount")
        .param("languagePreference", language)
        .param("getTotalCount", true)
        .param("start", request.start)
        .param("maxResults", request.limit)
}

/// Well-rated playable songs of one vocalist, the discovery pool.
pub fn discovery_request(language: &str, artist_id: u64, pool_size: usize, min_score: u32) -> RemoteRequest {
    song_listing(language, SongSort::RatingScore, PageRequest::first(pool_size))
        .param("artistId", artist_id)
        .param("minScore", min_score)
}
