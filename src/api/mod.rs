//! API Module
//!
//! Everything that talks to VocaDB: request building, the transport seam
//! and the per-kind query functions.

pub mod fetcher;
pub mod params;
pub mod transport;

pub use fetcher::{Discovery, DiscoveryOptions, FetchSettings, Fetcher, SongBatch};
pub use params::{RemoteRequest, SongQuery, SongSort, DEFAULT_TOP_HOURS};
pub use transport::{HttpTransport, Transport, DEFAULT_BASE_URL};
