//! Accumulated state of one browsing interaction

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::SongQuery;
use crate::models::{PageRequest, ResultPage, Track};

/// A session that may be handed to more than one task.
///
/// Holding the lock, even to read, makes `Paginator::load_more_shared`
/// reject with `LoadInProgress` until the guard is dropped.
pub type SharedSession = Arc<Mutex<PagedQuerySession>>;

// == Session ==
/// Append-only view over a query's results.
///
/// Items only ever grow and the cursor only ever moves forward. Both change
/// together in `append`, after a page has been fetched successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQuerySession {
    query: SongQuery,
    page_size: usize,
    /// Start offset of the most recently fetched page
    cursor: usize,
    items: Vec<Track>,
    known_total: usize,
    has_more: bool,
}

impl PagedQuerySession {
    pub(crate) fn from_first_page(query: SongQuery, page_size: usize, page: ResultPage<Track>) -> Self {
        let has_more = continues(&page);
        Self {
            query,
            page_size,
            cursor: 0,
            items: page.items,
            known_total: page.total_count,
            has_more,
        }
    }

    /// Window the next `load_more` asks for.
    pub fn next_request(&self) -> PageRequest {
        PageRequest::new(self.cursor + self.page_size, self.page_size)
    }

    /// Records a fetched page and hands back a copy of what was appended.
    pub(crate) fn append(&mut self, request: PageRequest, page: ResultPage<Track>) -> Vec<Track> {
        self.has_more = continues(&page);
        self.known_total = page.total_count;
        self.cursor = request.start;

        let appended = page.items;
        self.items.extend(appended.iter().cloned());
        appended
    }

    pub fn query(&self) -> &SongQuery {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn items(&self) -> &[Track] {
        &self.items
    }

    pub fn known_total(&self) -> usize {
        self.known_total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }
}

/// An empty page ends the session even if the server claims more.
fn continues(page: &ResultPage<Track>) -> bool {
    page.has_more && !page.items.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(ids: std::ops::Range<u64>) -> Vec<Track> {
        ids.map(|id| serde_json::from_value(serde_json::json!({ "id": id })).unwrap())
            .collect()
    }

    #[test]
    fn test_first_page_initializes_state() {
        let request = PageRequest::first(20);
        let session = PagedQuerySession::from_first_page(
            SongQuery::by_artist(1),
            20,
            ResultPage::new(tracks(0..20), 45, request),
        );

        assert_eq!(session.len(), 20);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.known_total(), 45);
        assert!(session.has_more());
        assert_eq!(session.next_request(), PageRequest::new(20, 20));
    }

    #[test]
    fn test_append_advances_cursor_and_keeps_order() {
        let mut session = PagedQuerySession::from_first_page(
            SongQuery::by_tag(481),
            20,
            ResultPage::new(tracks(0..20), 45, PageRequest::first(20)),
        );

        let request = session.next_request();
        let appended = session.append(request, ResultPage::new(tracks(20..40), 45, request));

        assert_eq!(appended.len(), 20);
        assert_eq!(session.cursor(), 20);
        let ids: Vec<u64> = session.items().iter().map(|t| t.id).collect();
        assert_eq!(ids, (0..40).collect::<Vec<u64>>());
        assert_eq!(session.next_request(), PageRequest::new(40, 20));
    }

    #[test]
    fn test_empty_page_ends_session() {
        let request = PageRequest::first(20);
        let page = ResultPage {
            items: Vec::new(),
            total_count: 100,
            has_more: true,
        };
        let session = PagedQuerySession::from_first_page(SongQuery::top_rated(24), 20, page);

        assert!(!session.has_more());
        assert!(session.is_empty());
        assert_eq!(session.next_request(), PageRequest::new(request.end(), 20));
    }
}
