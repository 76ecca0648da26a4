//! Catalog controller methods (search, refresh, incremental loading)

use crate::model::{ActiveSection, FetchTicket};
use super::{AppController, InFlightFetch};

impl AppController {
    /// Apply the search bar contents as the new feed query
    pub async fn submit_search(&self) {
        let model = self.model.lock().await;
        let query = model.search_query().await;
        tracing::debug!(query = ?query, "Submitting search");
        let ticket = model.feed_set_query(query).await;
        model.set_active_section(ActiveSection::Catalog).await;
        drop(model);

        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    /// Drop every loaded page and reload from page one
    pub async fn refresh_catalog(&self) {
        let ticket = self.model.lock().await.feed_invalidate().await;
        if let Some(ticket) = ticket {
            tracing::debug!(generation = ticket.generation, "Refreshing catalog");
            self.spawn_fetch(ticket);
        }
    }

    /// Request the next page once the selection nears the end of the list
    pub async fn load_more_if_needed(&self) {
        let model = self.model.lock().await;
        if !model.sentinel_reached().await {
            return;
        }
        let ticket = model.feed_load_more().await;
        drop(model);

        if let Some(ticket) = ticket {
            tracing::debug!(page = ticket.page, "Loading more books");
            self.spawn_fetch(ticket);
        }
    }

    /// Start fetching `ticket`'s page and abort the fetch it supersedes.
    ///
    /// Tickets can reach this point out of order when a background task and the
    /// input loop both issue one. A ticket older than the one in flight is stale
    /// already and is not started.
    pub(crate) fn spawn_fetch(&self, ticket: FetchTicket) {
        let mut slot = match self.fetch_task.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(current) = slot.as_ref() {
            if (current.generation, current.page) > (ticket.generation, ticket.page) {
                tracing::debug!(
                    page = ticket.page,
                    generation = ticket.generation,
                    "Skipped fetch older than the one in flight"
                );
                return;
            }
        }

        let generation = ticket.generation;
        let page = ticket.page;
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            controller.run_fetch(ticket).await;
        });

        if let Some(previous) = slot.replace(InFlightFetch { generation, page, handle }) {
            previous.handle.abort();
        }
    }

    async fn run_fetch(&self, ticket: FetchTicket) {
        let lms = self.model.lock().await.get_lms_client().await;
        let result = match lms {
            Some(lms) => lms.list_books(&ticket.query, ticket.page, ticket.size).await,
            None => Err(anyhow::anyhow!("No library server configured")),
        };

        // Feed failures show inline in the catalog, never as a blocking popup
        let model = self.model.lock().await;
        let applied = match result {
            Ok(books) => {
                tracing::info!(
                    page = ticket.page,
                    loaded = books.len(),
                    "Catalog page loaded"
                );
                model.apply_feed_page(&ticket, books).await
            }
            Err(e) => {
                tracing::error!(page = ticket.page, error = %e, "Failed to load catalog page");
                model.apply_feed_error(&ticket, Self::format_error(&e)).await
            }
        };

        if !applied {
            tracing::debug!(
                page = ticket.page,
                generation = ticket.generation,
                "Discarded stale catalog response"
            );
        }
    }
}
