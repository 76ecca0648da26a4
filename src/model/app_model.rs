//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::book::{BookDetail, BookSummary};
use super::feed::{CatalogFeed, FeedQuery, FetchTicket};
use super::form::BookForm;
use super::lms_client::LmsClient;
use super::types::{ActiveSection, Overlay, UiState};

/// Main application model containing all state
pub struct AppModel {
    pub lms: Option<LmsClient>,
    pub ui_state: Arc<Mutex<UiState>>,
    feed: Arc<Mutex<CatalogFeed>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    /// Rows from the end of the list at which the next page is requested
    pub const SENTINEL_ROWS: usize = 3;

    const ERROR_TTL_SECS: u64 = 5;

    pub fn new(page_size: u32) -> Self {
        Self {
            lms: None,
            ui_state: Arc::new(Mutex::new(UiState::default())),
            feed: Arc::new(Mutex::new(CatalogFeed::new(page_size))),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_lms_client(&mut self, client: LmsClient) {
        self.lms = Some(client);
    }

    pub async fn get_lms_client(&self) -> Option<LmsClient> {
        self.lms.clone()
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    // ========================================================================
    // Catalog feed
    // ========================================================================

    pub async fn get_feed(&self) -> CatalogFeed {
        self.feed.lock().await.clone()
    }

    pub async fn feed_set_query(&self, query: FeedQuery) -> Option<FetchTicket> {
        let ticket = self.feed.lock().await.set_query(query);
        if ticket.is_some() {
            self.ui_state.lock().await.catalog_selected = 0;
        }
        ticket
    }

    pub async fn feed_invalidate(&self) -> Option<FetchTicket> {
        let ticket = self.feed.lock().await.invalidate();
        if ticket.is_some() {
            self.ui_state.lock().await.catalog_selected = 0;
        }
        ticket
    }

    pub async fn feed_load_more(&self) -> Option<FetchTicket> {
        self.feed.lock().await.load_more()
    }

    pub async fn apply_feed_page(&self, ticket: &FetchTicket, records: Vec<BookSummary>) -> bool {
        self.feed.lock().await.on_fetch_resolved(ticket, records)
    }

    pub async fn apply_feed_error(&self, ticket: &FetchTicket, error: String) -> bool {
        self.feed.lock().await.on_fetch_failed(ticket, error)
    }

    pub async fn close_feed(&self) {
        self.feed.lock().await.close();
    }

    /// Whether the selection has reached the bottom rows of the loaded list
    pub async fn sentinel_reached(&self) -> bool {
        let len = self.feed.lock().await.len();
        let selected = self.ui_state.lock().await.catalog_selected;
        len > 0 && selected + Self::SENTINEL_ROWS >= len
    }

    pub async fn selected_book(&self) -> Option<BookSummary> {
        let selected = self.ui_state.lock().await.catalog_selected;
        self.feed.lock().await.get(selected).cloned()
    }

    pub async fn catalog_move_up(&self) {
        let mut state = self.ui_state.lock().await;
        state.catalog_selected = state.catalog_selected.saturating_sub(1);
    }

    pub async fn catalog_move_down(&self) {
        let len = self.feed.lock().await.len();
        let mut state = self.ui_state.lock().await;
        if state.catalog_selected + 1 < len {
            state.catalog_selected += 1;
        }
    }

    // ========================================================================
    // Sections & search bar
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn cycle_section_forward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.next();
    }

    pub async fn cycle_section_backward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.prev();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        let mut state = self.ui_state.lock().await;
        state.active_section = section;
    }

    pub async fn append_to_search(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        state.search_input.push(c);
    }

    pub async fn backspace_search(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_input.pop();
    }

    pub async fn clear_search_input(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_input.clear();
    }

    pub async fn toggle_search_field(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_field = state.search_field.toggle();
    }

    /// The query the search bar currently describes
    pub async fn search_query(&self) -> FeedQuery {
        let state = self.ui_state.lock().await;
        FeedQuery::new(state.search_field, &state.search_input)
    }

    // ========================================================================
    // Errors
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > Self::ERROR_TTL_SECS {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    pub async fn show_overlay(&self, overlay: Overlay) {
        self.ui_state.lock().await.overlay = Some(overlay);
    }

    pub async fn hide_overlay(&self) {
        self.ui_state.lock().await.overlay = None;
    }

    pub async fn get_overlay(&self) -> Option<Overlay> {
        self.ui_state.lock().await.overlay.clone()
    }

    /// Run `f` on the open overlay, if any
    pub async fn update_overlay<R>(&self, f: impl FnOnce(&mut Overlay) -> R) -> Option<R> {
        let mut state = self.ui_state.lock().await;
        state.overlay.as_mut().map(f)
    }

    /// Run `f` on the open book form, if the form is the open overlay
    pub async fn update_form<R>(&self, f: impl FnOnce(&mut BookForm) -> R) -> Option<R> {
        let mut state = self.ui_state.lock().await;
        match state.overlay.as_mut() {
            Some(Overlay::BookForm(form)) => Some(f(form)),
            _ => None,
        }
    }

    /// Fill in a detail overlay, unless the user has moved on to another book
    pub async fn set_book_detail(&self, book: BookDetail) {
        let mut state = self.ui_state.lock().await;
        if let Some(Overlay::BookDetail { id, detail, .. }) = state.overlay.as_mut() {
            if *id == book.book_manage_id {
                *detail = Some(Box::new(book));
            }
        }
    }

    // ========================================================================
    // In-flight deletes
    // ========================================================================

    /// Mark a delete as started. Returns `false` if one is already running for `id`.
    pub async fn begin_delete(&self, id: &str) -> bool {
        self.ui_state.lock().await.pending_deletes.insert(id.to_string())
    }

    pub async fn finish_delete(&self, id: &str) {
        self.ui_state.lock().await.pending_deletes.remove(id);
    }

    pub async fn is_delete_pending(&self, id: &str) -> bool {
        self.ui_state.lock().await.pending_deletes.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SearchField;

    fn books(count: usize) -> Vec<BookSummary> {
        (0..count)
            .map(|i| BookSummary {
                id: format!("Custom_{}", i),
                title: format!("Book {}", i),
                author: None,
                price: None,
                quantity: 0,
                cover_image: None,
            })
            .collect()
    }

    async fn loaded_model(count: usize) -> AppModel {
        let model = AppModel::new(10);
        let ticket = model.feed_invalidate().await.unwrap();
        assert!(model.apply_feed_page(&ticket, books(count)).await);
        model
    }

    #[tokio::test]
    async fn selection_is_clamped_to_loaded_rows() {
        let model = loaded_model(2).await;
        model.catalog_move_up().await;
        assert_eq!(model.get_ui_state().await.catalog_selected, 0);

        for _ in 0..5 {
            model.catalog_move_down().await;
        }
        assert_eq!(model.get_ui_state().await.catalog_selected, 1);
        assert_eq!(model.selected_book().await.unwrap().id, "Custom_1");
    }

    #[tokio::test]
    async fn sentinel_fires_near_the_bottom() {
        let model = loaded_model(10).await;
        assert!(!model.sentinel_reached().await);

        for _ in 0..6 {
            model.catalog_move_down().await;
        }
        assert!(!model.sentinel_reached().await);
        model.catalog_move_down().await;
        assert!(model.sentinel_reached().await);
    }

    #[tokio::test]
    async fn empty_feed_never_reaches_sentinel() {
        let model = AppModel::new(10);
        assert!(!model.sentinel_reached().await);
    }

    #[tokio::test]
    async fn new_query_resets_selection() {
        let model = loaded_model(10).await;
        model.catalog_move_down().await;

        model.append_to_search('D').await;
        let query = model.search_query().await;
        assert_eq!(query, FeedQuery::Title("D".into()));
        assert!(model.feed_set_query(query.clone()).await.is_some());
        assert_eq!(model.get_ui_state().await.catalog_selected, 0);
        assert!(model.get_feed().await.is_empty());

        assert!(model.feed_set_query(query).await.is_none());
    }

    #[tokio::test]
    async fn search_field_toggle_changes_query() {
        let model = AppModel::new(10);
        for c in "Herbert".chars() {
            model.append_to_search(c).await;
        }
        model.toggle_search_field().await;
        assert_eq!(model.get_ui_state().await.search_field, SearchField::Author);
        assert_eq!(model.search_query().await, FeedQuery::Author("Herbert".into()));

        model.clear_search_input().await;
        assert_eq!(model.search_query().await, FeedQuery::All);
    }

    #[tokio::test]
    async fn one_delete_per_book_at_a_time() {
        let model = AppModel::new(10);
        assert!(model.begin_delete("Custom_1").await);
        assert!(!model.begin_delete("Custom_1").await);
        assert!(model.begin_delete("Custom_2").await);
        assert!(model.is_delete_pending("Custom_1").await);

        model.finish_delete("Custom_1").await;
        assert!(!model.is_delete_pending("Custom_1").await);
        assert!(model.begin_delete("Custom_1").await);
    }

    #[tokio::test]
    async fn late_feed_result_after_close_is_ignored() {
        let model = AppModel::new(10);
        let ticket = model.feed_invalidate().await.unwrap();
        model.close_feed().await;

        assert!(!model.apply_feed_page(&ticket, books(3)).await);
        assert!(!model.apply_feed_error(&ticket, "late".into()).await);
        assert!(model.get_feed().await.is_empty());
    }

    #[tokio::test]
    async fn detail_for_another_book_is_not_shown() {
        let model = AppModel::new(10);
        model
            .show_overlay(Overlay::BookDetail { id: "Custom_2".into(), detail: None, scroll: 0 })
            .await;

        let json = serde_json::json!({
            "book_manage_id": "Custom_1", "id": "x", "title": "Old", "isbn": "1",
            "author_id": "a"
        });
        let other: BookDetail = serde_json::from_value(json).unwrap();
        model.set_book_detail(other).await;

        match model.get_overlay().await {
            Some(Overlay::BookDetail { detail, .. }) => assert!(detail.is_none()),
            other => panic!("unexpected overlay {:?}", other),
        }
    }

    #[tokio::test]
    async fn errors_clear_manually() {
        let model = AppModel::new(10);
        model.set_error("Book not found.".into()).await;
        assert!(model.has_error().await);
        model.auto_clear_old_errors().await;
        assert!(model.has_error().await);
        model.clear_error().await;
        assert!(!model.has_error().await);
    }
}
