//! Domain models for VocaDB results
//!
//! Tracks and artists as the remote service returns them, plus the page
//! shapes the fetcher and the coordinator hand to the UI.

pub mod page;
pub mod track;

// Re-export commonly used types
pub use page::{PageRequest, ResultPage};
pub use track::{ArtistCredit, ArtistRef, ArtistSummary, PvReference, PvService, Track};
