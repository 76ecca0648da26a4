//! Book and author mutations (detail, delete, scrape, create/edit)

use anyhow::Result;

use crate::model::{
    AuthorCreate, AuthorPicker, BookForm, FormField, LmsClient, Overlay,
};
use super::AppController;

impl AppController {
    async fn lms_client(&self) -> Option<LmsClient> {
        self.model.lock().await.get_lms_client().await
    }

    // ========================================================================
    // Detail
    // ========================================================================

    pub async fn open_book_detail(&self) {
        let model = self.model.lock().await;
        let Some(book) = model.selected_book().await else {
            return;
        };
        model
            .show_overlay(Overlay::BookDetail { id: book.id.clone(), detail: None, scroll: 0 })
            .await;
        drop(model);

        let controller = self.clone();
        tokio::spawn(async move {
            let Some(lms) = controller.lms_client().await else { return };
            match lms.get_book(&book.id).await {
                Ok(detail) => {
                    controller.model.lock().await.set_book_detail(detail).await;
                }
                Err(e) => {
                    tracing::error!(id = %book.id, error = %e, "Failed to load book detail");
                    let model = controller.model.lock().await;
                    let still_open = matches!(
                        model.get_overlay().await,
                        Some(Overlay::BookDetail { id, .. }) if id == book.id
                    );
                    if still_open {
                        model.hide_overlay().await;
                    }
                    model.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }

    // ========================================================================
    // Delete
    // ========================================================================

    pub async fn request_delete(&self) {
        let model = self.model.lock().await;
        if let Some(book) = model.selected_book().await {
            if model.is_delete_pending(&book.id).await {
                return;
            }
            model
                .show_overlay(Overlay::ConfirmDelete { id: book.id, title: book.title })
                .await;
        }
    }

    pub async fn confirm_delete(&self, id: String) {
        let model = self.model.lock().await;
        model.hide_overlay().await;
        if !model.begin_delete(&id).await {
            tracing::debug!(id, "Delete already in flight");
            return;
        }
        drop(model);

        let controller = self.clone();
        tokio::spawn(async move {
            let Some(lms) = controller.lms_client().await else { return };
            let result = lms.delete_book(&id).await;
            controller.model.lock().await.finish_delete(&id).await;

            match result {
                Ok(()) => {
                    tracing::info!(id, "Book deleted");
                    controller.refresh_catalog().await;
                }
                Err(e) => {
                    tracing::error!(id, error = %e, "Failed to delete book");
                    controller.model.lock().await.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }

    // ========================================================================
    // Scrape
    // ========================================================================

    pub async fn open_add_book(&self) {
        self.model
            .lock()
            .await
            .show_overlay(Overlay::AddBook { url: String::new(), scraping: false })
            .await;
    }

    /// Submit the URL typed into the add-book overlay for scraping
    pub async fn submit_scrape(&self) {
        let model = self.model.lock().await;
        let url = model
            .update_overlay(|overlay| match overlay {
                Overlay::AddBook { url, scraping } if !*scraping && !url.trim().is_empty() => {
                    *scraping = true;
                    Some(url.trim().to_string())
                }
                _ => None,
            })
            .await
            .flatten();
        drop(model);

        let Some(url) = url else { return };

        let controller = self.clone();
        tokio::spawn(async move {
            let Some(lms) = controller.lms_client().await else { return };
            match lms.scrape_book(&url).await {
                Ok(()) => {
                    tracing::info!(url, "Scrape request accepted");
                    controller.model.lock().await.hide_overlay().await;
                    // The server creates the book in the background
                    tokio::time::sleep(controller.scrape_settle).await;
                    controller.refresh_catalog().await;
                }
                Err(e) => {
                    tracing::error!(url, error = %e, "Scrape request failed");
                    let model = controller.model.lock().await;
                    model
                        .update_overlay(|overlay| {
                            if let Overlay::AddBook { scraping, .. } = overlay {
                                *scraping = false;
                            }
                        })
                        .await;
                    model.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }

    // ========================================================================
    // Create / edit form
    // ========================================================================

    pub async fn open_create_form(&self) {
        self.model
            .lock()
            .await
            .show_overlay(Overlay::BookForm(Box::new(BookForm::create())))
            .await;
    }

    /// Fetch the selected book and open it in the edit form
    pub async fn open_edit_form(&self) {
        let Some(book) = self.model.lock().await.selected_book().await else {
            return;
        };
        let Some(lms) = self.lms_client().await else { return };

        let controller = self.clone();
        tokio::spawn(async move {
            match lms.get_book(&book.id).await {
                Ok(detail) => {
                    controller
                        .model
                        .lock()
                        .await
                        .show_overlay(Overlay::BookForm(Box::new(BookForm::edit(detail))))
                        .await;
                }
                Err(e) => {
                    tracing::error!(id = %book.id, error = %e, "Failed to load book for editing");
                    controller.model.lock().await.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }

    /// Validate the open form, upload local images, then create or update the book
    pub async fn submit_form(&self) {
        let model = self.model.lock().await;
        let form = model
            .update_form(|form| {
                if form.submitting {
                    return None;
                }
                let checked = if form.is_edit() {
                    form.build_update().map(|_| ())
                } else {
                    form.build_create().map(|_| ())
                };
                match checked {
                    Ok(()) => {
                        form.submitting = true;
                        form.validation_error = None;
                        Some(form.clone())
                    }
                    Err(e) => {
                        form.validation_error = Some(e.to_string());
                        None
                    }
                }
            })
            .await
            .flatten();
        drop(model);

        let Some(form) = form else { return };
        let Some(lms) = self.lms_client().await else { return };

        let controller = self.clone();
        tokio::spawn(async move {
            match Self::save_form(&lms, form).await {
                Ok(id) => {
                    tracing::info!(id, "Book saved");
                    controller.model.lock().await.hide_overlay().await;
                    controller.refresh_catalog().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to save book");
                    let model = controller.model.lock().await;
                    model.update_form(|form| form.submitting = false).await;
                    model.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }

    async fn save_form(lms: &LmsClient, mut form: BookForm) -> Result<String> {
        let uploads = form.pending_uploads();
        if !uploads.is_empty() {
            let paths: Vec<_> = uploads.iter().map(|(_, path)| path.clone()).collect();
            let references = lms.upload_files(&paths).await?;
            for ((field, _), reference) in uploads.into_iter().zip(references) {
                form.set_value(field, reference);
            }
        }

        match form.editing_id() {
            Some(id) => {
                let update = form.build_update()?;
                if update.is_empty() {
                    tracing::debug!(id, "No changes to save");
                    return Ok(id.to_string());
                }
                let book = lms.update_book(id, &update).await?;
                Ok(book.book_manage_id)
            }
            None => {
                let book = lms.create_book(&form.build_create()?).await?;
                Ok(book.book_manage_id)
            }
        }
    }

    // ========================================================================
    // Author picker
    // ========================================================================

    /// Open the picker from the form's author field and list all authors
    pub async fn open_author_picker(&self) {
        let opened = self
            .model
            .lock()
            .await
            .update_form(|form| {
                if form.selected_field() != FormField::Author || form.author_picker.is_some() {
                    return false;
                }
                form.author_picker = Some(AuthorPicker::default());
                true
            })
            .await
            .unwrap_or(false);

        if opened {
            self.search_authors().await;
        }
    }

    /// Search authors by the name typed into the picker
    pub async fn search_authors(&self) {
        let name = self
            .model
            .lock()
            .await
            .update_form(|form| {
                form.author_picker.as_mut().map(|picker| {
                    picker.loading = true;
                    picker.input.trim().to_string()
                })
            })
            .await
            .flatten();
        let Some(name) = name else { return };
        let Some(lms) = self.lms_client().await else { return };

        let controller = self.clone();
        tokio::spawn(async move {
            let filter = Some(name.as_str()).filter(|n| !n.is_empty());
            let result = lms.list_authors(filter, 1, LmsClient::AUTHOR_SEARCH_SIZE).await;

            let model = controller.model.lock().await;
            match result {
                Ok(authors) => {
                    tracing::debug!(name, found = authors.len(), "Author search completed");
                    model
                        .update_form(|form| {
                            if let Some(picker) = form.author_picker.as_mut() {
                                // A newer search may have replaced the input meanwhile
                                if picker.input.trim() == name {
                                    picker.set_authors(authors);
                                }
                            }
                        })
                        .await;
                }
                Err(e) => {
                    tracing::error!(name, error = %e, "Author search failed");
                    model
                        .update_form(|form| {
                            if let Some(picker) = form.author_picker.as_mut() {
                                picker.loading = false;
                            }
                        })
                        .await;
                    model.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }

    /// Use the highlighted author for the form
    pub async fn select_author(&self) {
        self.model
            .lock()
            .await
            .update_form(|form| {
                let author = form
                    .author_picker
                    .as_ref()
                    .and_then(|picker| picker.selected_author().cloned());
                if let Some(author) = author {
                    form.set_author(author);
                }
            })
            .await;
    }

    /// Create an author named after the picker input and select it
    pub async fn create_author(&self) {
        let name = self
            .model
            .lock()
            .await
            .update_form(|form| form.author_picker.as_ref().map(|p| p.input.trim().to_string()))
            .await
            .flatten()
            .filter(|name| !name.is_empty());
        let Some(name) = name else { return };
        let Some(lms) = self.lms_client().await else { return };

        let controller = self.clone();
        tokio::spawn(async move {
            let request = AuthorCreate { name, description: None };
            let result = lms.create_author(&request).await;

            let model = controller.model.lock().await;
            match result {
                Ok(author) => {
                    tracing::info!(author_id = %author.id, name = %author.name, "Author created");
                    model.update_form(|form| form.set_author(author)).await;
                }
                Err(e) => {
                    tracing::error!(name = %request.name, error = %e, "Failed to create author");
                    model.set_error(Self::format_error(&e)).await;
                }
            }
        });
    }
}
