//! Catalog feed: the incrementally loaded, search-filtered list of books
//!
//! `CatalogFeed` is a plain state machine. Operations that need the network
//! hand back a [`FetchTicket`]; the controller performs the request and reports
//! the outcome with the same ticket. A ticket only applies while it still
//! matches the feed's current query and generation, so a slow response for a
//! superseded search can never leak into the list.

use std::collections::HashSet;

use super::book::BookSummary;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which book attribute the search bar filters on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SearchField {
    #[default]
    Title,
    Author,
}

impl SearchField {
    pub fn toggle(self) -> Self {
        match self {
            Self::Title => Self::Author,
            Self::Author => Self::Title,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
        }
    }
}

/// The active catalog filter. Two queries are the same query iff they are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum FeedQuery {
    #[default]
    All,
    Title(String),
    Author(String),
}

impl FeedQuery {
    /// Build a query from search bar input. Blank input means no filter.
    pub fn new(field: SearchField, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::All;
        }
        match field {
            SearchField::Title => Self::Title(value.to_string()),
            SearchField::Author => Self::Author(value.to_string()),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Title(v) => Some(v),
            _ => None,
        }
    }

    pub fn author_name(&self) -> Option<&str> {
        match self {
            Self::Author(v) => Some(v),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::All => "all books".to_string(),
            Self::Title(v) => format!("title \"{}\"", v),
            Self::Author(v) => format!("author \"{}\"", v),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
    Error,
}

impl FetchState {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::LoadingInitial | Self::LoadingMore)
    }
}

/// A request the feed wants issued. Carries everything needed to decide,
/// when the response lands, whether it still belongs to this feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub query: FeedQuery,
    pub generation: u64,
    pub page: u32,
    pub size: u32,
}

/// One fetched page, numbered from 1
#[derive(Clone, Debug)]
pub struct Page {
    pub number: u32,
    pub records: Vec<BookSummary>,
}

#[derive(Clone, Debug)]
pub struct CatalogFeed {
    query: FeedQuery,
    pages: Vec<Page>,
    fetch_state: FetchState,
    has_more: bool,
    page_size: u32,
    generation: u64,
    error: Option<String>,
    seen_ids: HashSet<String>,
    closed: bool,
}

impl CatalogFeed {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: FeedQuery::All,
            pages: Vec::new(),
            fetch_state: FetchState::Idle,
            has_more: true,
            page_size: page_size.max(1),
            generation: 0,
            error: None,
            seen_ids: HashSet::new(),
            closed: false,
        }
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|p| p.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All loaded records in fetch order
    pub fn records(&self) -> impl Iterator<Item = &BookSummary> {
        self.pages.iter().flat_map(|p| p.records.iter())
    }

    pub fn get(&self, index: usize) -> Option<&BookSummary> {
        self.records().nth(index)
    }

    /// Switch to `query`. Returns `None` when it equals the current query.
    pub fn set_query(&mut self, query: FeedQuery) -> Option<FetchTicket> {
        if self.closed || query == self.query {
            return None;
        }
        self.query = query;
        Some(self.restart())
    }

    /// Drop everything and reload page 1 of the current query
    pub fn invalidate(&mut self) -> Option<FetchTicket> {
        if self.closed {
            return None;
        }
        Some(self.restart())
    }

    /// Request the next page. No-op while a fetch is outstanding or once a
    /// short page has shown there is nothing left.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.closed || self.fetch_state.is_loading() || !self.has_more {
            return None;
        }
        self.fetch_state = if self.pages.is_empty() {
            FetchState::LoadingInitial
        } else {
            FetchState::LoadingMore
        };
        Some(self.ticket(self.pages.len() as u32 + 1))
    }

    /// Apply a page of records. Returns `false` when the ticket is stale and
    /// the records were dropped.
    pub fn on_fetch_resolved(&mut self, ticket: &FetchTicket, records: Vec<BookSummary>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.has_more = records.len() as u32 >= self.page_size;
        let records: Vec<BookSummary> = records
            .into_iter()
            .filter(|r| self.seen_ids.insert(r.id.clone()))
            .collect();
        self.pages.push(Page {
            number: ticket.page,
            records,
        });
        self.fetch_state = FetchState::Idle;
        self.error = None;
        true
    }

    /// Record a failed fetch. Pages already loaded are kept.
    pub fn on_fetch_failed(&mut self, ticket: &FetchTicket, error: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.fetch_state = FetchState::Error;
        self.error = Some(error.into());
        true
    }

    /// Tear the feed down. Every outstanding ticket becomes stale.
    pub fn close(&mut self) {
        self.closed = true;
        self.generation += 1;
        self.pages.clear();
        self.seen_ids.clear();
        self.fetch_state = FetchState::Idle;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn restart(&mut self) -> FetchTicket {
        self.generation += 1;
        self.pages.clear();
        self.seen_ids.clear();
        self.has_more = true;
        self.error = None;
        self.fetch_state = FetchState::LoadingInitial;
        self.ticket(1)
    }

    fn ticket(&self, page: u32) -> FetchTicket {
        FetchTicket {
            query: self.query.clone(),
            generation: self.generation,
            page,
            size: self.page_size,
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        !self.closed
            && self.fetch_state.is_loading()
            && ticket.generation == self.generation
            && ticket.query == self.query
            && ticket.page as usize == self.pages.len() + 1
    }
}

impl Default for CatalogFeed {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn books(prefix: &str, count: usize) -> Vec<BookSummary> {
        (0..count)
            .map(|i| BookSummary {
                id: format!("{}-{}", prefix, i),
                title: format!("{} {}", prefix, i),
                author: Some("Frank Herbert".to_string()),
                price: Some(10000.0),
                quantity: 1,
                cover_image: None,
            })
            .collect()
    }

    fn titles(feed: &CatalogFeed) -> Vec<String> {
        feed.records().map(|b| b.title.clone()).collect()
    }

    #[fixture]
    fn feed() -> CatalogFeed {
        CatalogFeed::new(10)
    }

    #[rstest]
    #[case(SearchField::Title, "Dune", FeedQuery::Title("Dune".into()))]
    #[case(SearchField::Author, "  Herbert ", FeedQuery::Author("Herbert".into()))]
    #[case(SearchField::Title, "", FeedQuery::All)]
    #[case(SearchField::Author, "   ", FeedQuery::All)]
    fn query_from_search_input(#[case] field: SearchField, #[case] input: &str, #[case] expected: FeedQuery) {
        assert_eq!(FeedQuery::new(field, input), expected);
    }

    #[rstest]
    fn stale_response_from_previous_query_is_dropped(mut feed: CatalogFeed) {
        let a = feed.set_query(FeedQuery::Title("A".into())).unwrap();
        let b = feed.set_query(FeedQuery::Title("B".into())).unwrap();

        assert!(!feed.on_fetch_resolved(&a, books("a", 10)));
        assert!(feed.is_empty());
        assert_eq!(feed.fetch_state(), FetchState::LoadingInitial);

        assert!(feed.on_fetch_resolved(&b, books("b", 3)));
        assert!(!feed.on_fetch_resolved(&a, books("a", 10)));
        assert!(titles(&feed).iter().all(|t| t.starts_with('b')));
        assert_eq!(feed.len(), 3);
    }

    #[rstest]
    fn stale_failure_does_not_touch_state(mut feed: CatalogFeed) {
        let a = feed.set_query(FeedQuery::Author("A".into())).unwrap();
        let b = feed.set_query(FeedQuery::Author("B".into())).unwrap();

        assert!(!feed.on_fetch_failed(&a, "boom"));
        assert_eq!(feed.fetch_state(), FetchState::LoadingInitial);
        assert!(feed.error().is_none());
        assert!(feed.on_fetch_resolved(&b, books("b", 1)));
    }

    #[rstest]
    fn repeating_the_same_query_fetches_once(mut feed: CatalogFeed) {
        let q = FeedQuery::Title("Dune".into());
        assert!(feed.set_query(q.clone()).is_some());
        assert!(feed.set_query(q).is_none());
    }

    #[rstest]
    fn invalidate_refetches_first_page_of_same_query(mut feed: CatalogFeed) {
        let q = FeedQuery::Title("Dune".into());
        let first = feed.set_query(q.clone()).unwrap();
        feed.on_fetch_resolved(&first, books("d", 10));
        let second = feed.load_more().unwrap();
        feed.on_fetch_resolved(&second, books("e", 10));

        let again = feed.invalidate().unwrap();
        assert_eq!(again.page, 1);
        assert_eq!(again.query, q);
        assert!(feed.is_empty());
        assert_eq!(feed.fetch_state(), FetchState::LoadingInitial);
        assert!(feed.has_more());
    }

    #[rstest]
    fn in_flight_page_from_before_invalidate_is_dropped(mut feed: CatalogFeed) {
        let first = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&first, books("old", 10));
        let more = feed.load_more().unwrap();

        let fresh = feed.invalidate().unwrap();
        assert!(!feed.on_fetch_resolved(&more, books("late", 10)));
        assert!(feed.on_fetch_resolved(&fresh, books("new", 2)));
        assert_eq!(titles(&feed), vec!["new 0", "new 1"]);
    }

    #[rstest]
    fn pages_append_in_fetch_order(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&t, books("p1", 10));
        for prefix in ["p2", "p3"] {
            let t = feed.load_more().unwrap();
            feed.on_fetch_resolved(&t, books(prefix, 10));
        }
        let t = feed.load_more().unwrap();
        assert_eq!(t.page, 4);
        feed.on_fetch_resolved(&t, books("p4", 7));

        assert_eq!(feed.len(), 37);
        assert_eq!(feed.page_count(), 4);
        let numbers: Vec<u32> = feed.pages().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(feed.get(0).unwrap().title, "p1 0");
        assert_eq!(feed.get(10).unwrap().title, "p2 0");
        assert_eq!(feed.get(36).unwrap().title, "p4 6");
    }

    #[rstest]
    fn short_page_ends_pagination(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&t, books("x", 4));

        assert!(!feed.has_more());
        assert!(feed.load_more().is_none());
        assert_eq!(feed.fetch_state(), FetchState::Idle);
    }

    #[rstest]
    fn empty_first_page_ends_pagination(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&t, Vec::new());

        assert!(feed.is_empty());
        assert!(!feed.has_more());
        assert!(feed.load_more().is_none());
    }

    #[rstest]
    fn back_to_back_load_more_issues_one_fetch(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&t, books("a", 10));

        let first = feed.load_more();
        let second = feed.load_more();
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(feed.fetch_state(), FetchState::LoadingMore);
    }

    #[rstest]
    fn load_more_is_blocked_during_initial_load(mut feed: CatalogFeed) {
        feed.set_query(FeedQuery::Title("Dune".into())).unwrap();
        assert!(feed.load_more().is_none());
    }

    #[rstest]
    fn failed_load_more_keeps_pages_and_recovers(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&t, books("a", 10));

        let more = feed.load_more().unwrap();
        assert!(feed.on_fetch_failed(&more, "connection reset"));
        assert_eq!(feed.fetch_state(), FetchState::Error);
        assert_eq!(feed.error(), Some("connection reset"));
        assert_eq!(feed.len(), 10);

        let retry = feed.load_more().unwrap();
        assert_eq!(retry.page, 2);
        assert!(feed.on_fetch_resolved(&retry, books("b", 10)));
        assert_eq!(feed.fetch_state(), FetchState::Idle);
        assert!(feed.error().is_none());
        assert_eq!(feed.len(), 20);
    }

    #[rstest]
    fn failed_initial_load_leaves_list_empty(mut feed: CatalogFeed) {
        let t = feed.set_query(FeedQuery::Title("Dune".into())).unwrap();
        feed.on_fetch_failed(&t, "503 Service Unavailable");

        assert!(feed.is_empty());
        assert_eq!(feed.fetch_state(), FetchState::Error);

        let retry = feed.invalidate().unwrap();
        assert_eq!(retry.page, 1);
        assert!(feed.error().is_none());
    }

    #[rstest]
    fn duplicate_ids_across_pages_are_skipped(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.on_fetch_resolved(&t, books("a", 10));
        let more = feed.load_more().unwrap();

        // A book deleted elsewhere shifts the offset by one
        let mut shifted = books("a", 10).split_off(9);
        shifted.extend(books("b", 9));
        feed.on_fetch_resolved(&more, shifted);

        assert_eq!(feed.len(), 19);
        assert!(feed.has_more());
    }

    #[rstest]
    fn closed_feed_drops_everything(mut feed: CatalogFeed) {
        let t = feed.invalidate().unwrap();
        feed.close();

        assert!(!feed.on_fetch_resolved(&t, books("a", 10)));
        assert!(!feed.on_fetch_failed(&t, "late"));
        assert!(feed.invalidate().is_none());
        assert!(feed.load_more().is_none());
        assert!(feed.set_query(FeedQuery::Title("x".into())).is_none());
        assert!(feed.is_closed());
    }

    #[rstest]
    fn dune_scenario() {
        let mut feed = CatalogFeed::new(10);
        let first = feed.set_query(FeedQuery::new(SearchField::Title, "Dune")).unwrap();
        assert_eq!(first.query.title(), Some("Dune"));
        assert_eq!((first.page, first.size), (1, 10));

        feed.on_fetch_resolved(&first, books("dune", 10));
        assert!(feed.has_more());

        let second = feed.load_more().unwrap();
        assert_eq!(second.page, 2);
        feed.on_fetch_resolved(&second, books("more", 4));

        assert_eq!(feed.len(), 14);
        assert!(!feed.has_more());
        assert!(feed.load_more().is_none());
    }
}
