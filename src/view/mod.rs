//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, popups, scrollable lists)
//! - `layout`: Search bar and status line
//! - `catalog`: The book list
//! - `overlays`: Modal overlays (error, help, detail, delete, add, form)

mod utils;
mod layout;
mod catalog;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{CatalogFeed, Overlay, UiState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, ui_state: &UiState, feed: &CatalogFeed, api_url: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar + server
                Constraint::Min(0),    // Catalog
                Constraint::Length(1), // Status line
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], ui_state, api_url);
        catalog::render_catalog(frame, chunks[1], ui_state, feed);
        layout::render_status_line(frame, chunks[2], feed);

        match &ui_state.overlay {
            Some(Overlay::Help) => overlays::render_help_popup(frame),
            Some(Overlay::ConfirmDelete { title, .. }) => overlays::render_confirm_delete(frame, title),
            Some(Overlay::BookDetail { detail, scroll, .. }) => {
                overlays::render_book_detail(frame, detail.as_deref(), *scroll)
            }
            Some(Overlay::AddBook { url, scraping }) => overlays::render_add_book(frame, url, *scraping),
            Some(Overlay::BookForm(form)) => overlays::render_book_form(frame, form),
            None => {}
        }

        // Error notification draws above everything else
        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }
    }
}
