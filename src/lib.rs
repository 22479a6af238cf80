//! vocastats - a terminal client core for VocaDB rankings
//!
//! Query functions per listing kind over an injected transport, a TTL cache
//! shared between them, and load-more sessions on top.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;

pub use api::{Fetcher, HttpTransport, SongQuery, SongSort, Transport};
pub use cache::{SharedCache, TtlCache};
pub use config::Config;
pub use error::{ApiError, Result};
pub use models::{PageRequest, ResultPage, Track};
pub use pagination::{LoadMore, PagedQuerySession, Paginator};
