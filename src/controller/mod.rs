//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input
//! and coordinates between the model and the library API.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `catalog`: Search, refresh and incremental loading of the book list
//! - `mutations`: Book detail, delete, scrape, create/edit and author lookup

mod input;
mod catalog;
mod mutations;

use std::sync::Arc;
use std::time::Duration;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::model::AppModel;

/// Catalog request currently in flight
struct InFlightFetch {
    generation: u64,
    page: u32,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    /// Only ever replaced by a newer ticket, which aborts the old task
    fetch_task: Arc<std::sync::Mutex<Option<InFlightFetch>>>,
    scrape_settle: Duration,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>, scrape_settle: Duration) -> Self {
        Self {
            model,
            fetch_task: Arc::new(std::sync::Mutex::new(None)),
            scrape_settle,
        }
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        let status = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<reqwest::Error>())
            .and_then(reqwest::Error::status);
        let is_connect = error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
            .any(|e| e.is_connect() || e.is_timeout());

        match status {
            Some(StatusCode::UNPROCESSABLE_ENTITY) => {
                "The server rejected the input. Check the required fields.".to_string()
            }
            Some(StatusCode::NOT_FOUND) => "Book not found. It may have been deleted.".to_string(),
            Some(StatusCode::BAD_REQUEST) => {
                "Request rejected. A book with this ISBN may already exist.".to_string()
            }
            Some(status) if status.is_server_error() => {
                format!("Server error ({}). Please try again.", status.as_u16())
            }
            _ if is_connect => "Cannot reach the library server.".to_string(),
            _ => format!("Error: {}", error),
        }
    }
}
