//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{ActiveSection, FormField, Overlay};
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            model.set_should_quit(true).await;
            return Ok(());
        }

        // Handle error message first (blocks all other interactions)
        if model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                model.clear_error().await;
            }
            return Ok(());
        }

        if let Some(overlay) = model.get_overlay().await {
            drop(model);
            return self.handle_overlay_key(overlay, key).await;
        }

        let ui_state = model.get_ui_state().await;

        // Handle search input when in search section
        if ui_state.active_section == ActiveSection::Search {
            match key.code {
                KeyCode::Tab | KeyCode::BackTab => {
                    model.toggle_search_field().await;
                }
                KeyCode::Enter => {
                    drop(model);
                    self.submit_search().await;
                }
                KeyCode::Esc => {
                    if ui_state.search_input.is_empty() {
                        model.set_active_section(ActiveSection::Catalog).await;
                    } else {
                        model.clear_search_input().await;
                    }
                }
                KeyCode::Down => {
                    model.set_active_section(ActiveSection::Catalog).await;
                }
                KeyCode::Backspace => {
                    model.backspace_search().await;
                }
                KeyCode::Char(c) => {
                    model.append_to_search(c).await;
                }
                _ => {}
            }
            return Ok(());
        }

        // Catalog keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Tab => {
                model.cycle_section_forward().await;
            }
            KeyCode::BackTab => {
                model.cycle_section_backward().await;
            }
            KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Char('S') => {
                model.set_active_section(ActiveSection::Search).await;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                model.catalog_move_up().await;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                model.catalog_move_down().await;
                drop(model);
                self.load_more_if_needed().await;
            }
            KeyCode::Enter => {
                drop(model);
                self.open_book_detail().await;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                drop(model);
                self.refresh_catalog().await;
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                drop(model);
                self.open_add_book().await;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                drop(model);
                self.open_create_form().await;
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                drop(model);
                self.open_edit_form().await;
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                drop(model);
                self.request_delete().await;
            }
            // Show help popup
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                model.show_overlay(Overlay::Help).await;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_overlay_key(&self, overlay: Overlay, key: KeyEvent) -> Result<()> {
        match overlay {
            Overlay::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?')
                ) {
                    self.model.lock().await.hide_overlay().await;
                }
            }
            Overlay::ConfirmDelete { id, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.confirm_delete(id).await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.model.lock().await.hide_overlay().await;
                }
                _ => {}
            },
            Overlay::BookDetail { .. } => match key.code {
                KeyCode::Up | KeyCode::Down => {
                    let down = key.code == KeyCode::Down;
                    self.model
                        .lock()
                        .await
                        .update_overlay(|overlay| {
                            if let Overlay::BookDetail { scroll, .. } = overlay {
                                *scroll = if down {
                                    scroll.saturating_add(1)
                                } else {
                                    scroll.saturating_sub(1)
                                };
                            }
                        })
                        .await;
                }
                KeyCode::Char('e') | KeyCode::Char('E') => {
                    self.model.lock().await.hide_overlay().await;
                    self.open_edit_form().await;
                }
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.model.lock().await.hide_overlay().await;
                }
                _ => {}
            },
            Overlay::AddBook { scraping, .. } => self.handle_add_book_key(scraping, key).await,
            Overlay::BookForm(form) => {
                if form.author_picker.is_some() {
                    self.handle_author_picker_key(key).await;
                } else {
                    self.handle_form_key(form.submitting, form.selected_field(), key).await;
                }
            }
        }
        Ok(())
    }

    async fn handle_add_book_key(&self, scraping: bool, key: KeyEvent) {
        if scraping {
            return;
        }
        let model = self.model.lock().await;
        match key.code {
            KeyCode::Esc => {
                model.hide_overlay().await;
            }
            KeyCode::Enter => {
                drop(model);
                self.submit_scrape().await;
            }
            // Skip scraping and enter the book by hand
            KeyCode::Tab => {
                drop(model);
                self.open_create_form().await;
            }
            KeyCode::Backspace => {
                model
                    .update_overlay(|overlay| {
                        if let Overlay::AddBook { url, .. } = overlay {
                            url.pop();
                        }
                    })
                    .await;
            }
            KeyCode::Char(c) => {
                model
                    .update_overlay(|overlay| {
                        if let Overlay::AddBook { url, .. } = overlay {
                            url.push(c);
                        }
                    })
                    .await;
            }
            _ => {}
        }
    }

    async fn handle_form_key(&self, submitting: bool, field: FormField, key: KeyEvent) {
        if submitting {
            return;
        }
        let model = self.model.lock().await;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            drop(model);
            self.submit_form().await;
            return;
        }

        match key.code {
            KeyCode::Esc => {
                model.hide_overlay().await;
            }
            KeyCode::Up | KeyCode::BackTab => {
                model.update_form(|form| form.prev_field()).await;
            }
            KeyCode::Down | KeyCode::Tab => {
                model.update_form(|form| form.next_field()).await;
            }
            KeyCode::Enter if field == FormField::Author => {
                drop(model);
                self.open_author_picker().await;
            }
            KeyCode::Enter => {
                model.update_form(|form| form.next_field()).await;
            }
            KeyCode::Backspace => {
                model.update_form(|form| form.backspace()).await;
            }
            KeyCode::Char(c) => {
                model.update_form(|form| form.insert_char(c)).await;
            }
            _ => {}
        }
    }

    async fn handle_author_picker_key(&self, key: KeyEvent) {
        let model = self.model.lock().await;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('n') {
            drop(model);
            self.create_author().await;
            return;
        }

        match key.code {
            KeyCode::Esc => {
                model.update_form(|form| form.author_picker = None).await;
            }
            KeyCode::Up => {
                model
                    .update_form(|form| form.author_picker.as_mut().map(|p| p.move_up()))
                    .await;
            }
            KeyCode::Down => {
                model
                    .update_form(|form| form.author_picker.as_mut().map(|p| p.move_down()))
                    .await;
            }
            KeyCode::Tab => {
                drop(model);
                self.search_authors().await;
            }
            KeyCode::Enter => {
                drop(model);
                self.select_author().await;
            }
            KeyCode::Backspace => {
                model
                    .update_form(|form| form.author_picker.as_mut().map(|p| p.input.pop()))
                    .await;
            }
            KeyCode::Char(c) => {
                model
                    .update_form(|form| form.author_picker.as_mut().map(|p| p.input.push(c)))
                    .await;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    use super::*;
    use crate::model::AppModel;

    fn controller() -> AppController {
        AppController::new(Arc::new(Mutex::new(AppModel::new(10))), Duration::ZERO)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn typing_in_search_does_not_trigger_shortcuts() {
        let controller = controller();
        controller.handle_key_event(press(KeyCode::Char('/'))).await.unwrap();
        for c in "qa".chars() {
            controller.handle_key_event(press(KeyCode::Char(c))).await.unwrap();
        }

        let model = controller.model.lock().await;
        assert!(!model.should_quit().await);
        assert!(model.get_overlay().await.is_none());
        assert_eq!(model.get_ui_state().await.search_input, "qa");
    }

    #[tokio::test]
    async fn error_blocks_input_until_dismissed() {
        let controller = controller();
        controller.model.lock().await.set_error("Book not found.".into()).await;

        controller.handle_key_event(press(KeyCode::Char('q'))).await.unwrap();
        assert!(!controller.model.lock().await.should_quit().await);

        controller.handle_key_event(press(KeyCode::Esc)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Char('q'))).await.unwrap();
        assert!(controller.model.lock().await.should_quit().await);
    }

    #[tokio::test]
    async fn add_book_overlay_collects_url() {
        let controller = controller();
        controller.handle_key_event(press(KeyCode::Char('a'))).await.unwrap();
        for c in "http://x".chars() {
            controller.handle_key_event(press(KeyCode::Char(c))).await.unwrap();
        }
        controller.handle_key_event(press(KeyCode::Backspace)).await.unwrap();

        let overlay = controller.model.lock().await.get_overlay().await;
        match overlay {
            Some(Overlay::AddBook { url, scraping }) => {
                assert_eq!(url, "http://");
                assert!(!scraping);
            }
            other => panic!("unexpected overlay {:?}", other),
        }
    }

    #[tokio::test]
    async fn help_toggles() {
        let controller = controller();
        controller.handle_key_event(press(KeyCode::Char('h'))).await.unwrap();
        assert!(matches!(controller.model.lock().await.get_overlay().await, Some(Overlay::Help)));
        controller.handle_key_event(press(KeyCode::Esc)).await.unwrap();
        assert!(controller.model.lock().await.get_overlay().await.is_none());
    }
}
