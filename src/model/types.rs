//! Core type definitions for the application

use std::collections::HashSet;
use std::time::Instant;

use super::book::BookDetail;
use super::feed::SearchField;
use super::form::BookForm;

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    Catalog,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::Catalog,
            ActiveSection::Catalog => ActiveSection::Search,
        }
    }

    pub fn prev(self) -> Self {
        // Two sections: backwards is the same cycle
        self.next()
    }
}

/// Modal drawn over the catalog. Only one is open at a time.
#[derive(Clone, Debug)]
pub enum Overlay {
    Help,
    ConfirmDelete { id: String, title: String },
    /// `detail` is `None` while the book is being fetched
    BookDetail { id: String, detail: Option<Box<BookDetail>>, scroll: u16 },
    AddBook { url: String, scraping: bool },
    BookForm(Box<BookForm>),
}

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_input: String,
    pub search_field: SearchField,
    pub catalog_selected: usize,
    pub overlay: Option<Overlay>,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    /// Books with a delete request in flight
    pub pending_deletes: HashSet<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Catalog,
            search_input: String::new(),
            search_field: SearchField::Title,
            catalog_selected: 0,
            overlay: None,
            error_message: None,
            error_timestamp: None,
            pending_deletes: HashSet::new(),
        }
    }
}
