//! Pagination Coordinator
//!
//! Opens sessions on song queries and grows them one page at a time. A
//! session never loses fetched items and never asks for a page it holds.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{Fetcher, SongQuery};
use crate::error::{ApiError, Result};
use crate::models::{PageRequest, Track};
use crate::pagination::session::{PagedQuerySession, SharedSession};

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Outcome of a `load_more` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadMore {
    /// Items appended by this call, in server order
    pub appended: Vec<Track>,
    pub still_has_more: bool,
}

impl LoadMore {
    fn exhausted() -> Self {
        Self {
            appended: Vec::new(),
            still_has_more: false,
        }
    }
}

// == Paginator ==
#[derive(Clone)]
pub struct Paginator {
    fetcher: Arc<Fetcher>,
    page_size: usize,
}

impl Paginator {
    pub fn new(fetcher: Arc<Fetcher>, page_size: usize) -> Self {
        Self {
            fetcher,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// Fetches the first page of `query` and starts a session on it.
    pub async fn open_session(&self, query: SongQuery) -> Result<PagedQuerySession> {
        let request = PageRequest::first(self.page_size);
        let page = self.fetcher.fetch_page(&query, request).await?;

        info!(
            kind = query.kind(),
            received = page.len(),
            total = page.total_count,
            "session opened"
        );
        Ok(PagedQuerySession::from_first_page(query, self.page_size, page))
    }

    /// Fetches the page after the last one held and appends it.
    ///
    /// Makes no request once the session is exhausted. On failure the
    /// session is left as it was, so the call can simply be repeated.
    pub async fn load_more(&self, session: &mut PagedQuerySession) -> Result<LoadMore> {
        if !session.has_more() {
            debug!(kind = session.query().kind(), "session exhausted, nothing to load");
            return Ok(LoadMore::exhausted());
        }

        let request = session.next_request();
        let page = self.fetcher.fetch_page(session.query(), request).await?;
        let appended = session.append(request, page);

        debug!(
            start = request.start,
            appended = appended.len(),
            held = session.len(),
            "page appended"
        );
        Ok(LoadMore {
            appended,
            still_has_more: session.has_more(),
        })
    }

    /// `load_more` on a session other tasks may hold.
    ///
    /// A call made while another load on the same session is outstanding is
    /// rejected with `ApiError::LoadInProgress` rather than queued.
    ///
    /// Any held guard counts as outstanding, including one taken only to
    /// read items. Readers should copy what they need and drop the guard
    /// before the next `load_more_shared`.
    pub async fn load_more_shared(&self, session: &SharedSession) -> Result<LoadMore> {
        let mut guard = session.try_lock().map_err(|_| ApiError::LoadInProgress)?;
        self.load_more(&mut guard).await
    }
}
