//! Model module - Application state and data types
//!
//! - `types`: UI state, sections and overlays
//! - `book`: API records and display helpers
//! - `feed`: the incrementally loaded catalog list
//! - `form`: book create/edit form and author picker
//! - `lms_client`: library-management API client
//! - `app_model`: Main application model with state management methods

mod types;
mod book;
mod feed;
mod form;
mod lms_client;
mod app_model;

pub use types::{ActiveSection, Overlay, UiState};

pub use book::{format_price, format_timestamp, AuthorCreate, BookDetail, BookSummary};

pub use feed::{CatalogFeed, FeedQuery, FetchState, FetchTicket, SearchField, DEFAULT_PAGE_SIZE};

pub use form::{AuthorPicker, BookForm, FormField};

pub use lms_client::LmsClient;

pub use app_model::AppModel;
