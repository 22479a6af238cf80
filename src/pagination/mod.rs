//! Pagination Module
//!
//! Growable, append-only sessions over paginated song queries.

mod coordinator;
mod session;

pub use coordinator::{LoadMore, Paginator, DEFAULT_PAGE_SIZE};
pub use session::{PagedQuerySession, SharedSession};
