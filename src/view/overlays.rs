//! Overlay rendering (error notification, help, book detail, delete, add and edit)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::model::{
    format_price, format_timestamp, AuthorPicker, BookDetail, BookForm, FormField, UiState,
};
use super::utils::{popup_area, render_scrollable_list, truncate_string};

fn popup_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

pub fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
    if let Some(ref error_msg) = ui_state.error_message {
        let area = frame.area();

        let popup_width = 52.min(area.width.saturating_sub(4));
        let inner_width = popup_width.saturating_sub(4).max(1) as usize; // account for borders

        // Calculate how many lines the error message will take when wrapped
        let error_line_count = error_msg.chars().count().div_ceil(inner_width) as u16;

        let popup_area = popup_area(area, popup_width, 2 + error_line_count.max(1));

        // Clear the area behind the popup first
        frame.render_widget(Clear, popup_area);

        let error_widget = Paragraph::new(error_msg.to_string())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false })
            .block(popup_block(" Error (Esc to dismiss) ", Color::Red));

        frame.render_widget(error_widget, popup_area);
    }
}

pub fn render_help_popup(frame: &mut Frame) {
    let area = frame.area();

    // Define keybindings organized by category
    let keybindings = [
        ("", "── Catalog ──"),
        ("↑ / ↓", "Move selection (loads more at the end)"),
        ("Enter", "Show book detail"),
        ("R", "Reload catalog"),
        ("/ or S", "Focus search"),
        ("Tab", "Switch search / catalog"),
        ("", ""),
        ("", "── Search ──"),
        ("Tab", "Toggle title / author"),
        ("Enter", "Apply search"),
        ("Esc", "Clear input / leave search"),
        ("", ""),
        ("", "── Books ──"),
        ("A", "Add book from URL"),
        ("N", "New book (manual entry)"),
        ("E", "Edit selected book"),
        ("D / Delete", "Delete selected book"),
        ("", ""),
        ("", "── Book form ──"),
        ("↑ / ↓", "Move between fields"),
        ("Enter", "Next field / choose author"),
        ("Ctrl+S", "Save"),
        ("Tab", "Search authors (picker)"),
        ("Ctrl+N", "Create typed author (picker)"),
        ("", ""),
        ("", "── General ──"),
        ("H", "Toggle this help"),
        ("Q", "Quit"),
    ];

    let popup_area = popup_area(area, 62, keybindings.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                // Section header or empty line
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>14}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(popup_block(" Help (H or Esc to close) ", Color::Cyan))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}

pub fn render_confirm_delete(frame: &mut Frame, title: &str) {
    let popup_area = popup_area(frame.area(), 50, 6);
    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from("Delete this book?"),
        Line::from(Span::styled(
            truncate_string(title, popup_area.width.saturating_sub(4) as usize),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("y: delete   n / Esc: cancel", Style::default().fg(Color::DarkGray))),
    ];

    let widget = Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow))
        .block(popup_block(" Confirm Delete ", Color::Yellow));
    frame.render_widget(widget, popup_area);
}

pub fn render_book_detail(frame: &mut Frame, detail: Option<&BookDetail>, scroll: u16) {
    let area = frame.area();
    let popup_area = popup_area(area, 80, area.height);
    frame.render_widget(Clear, popup_area);

    let block = popup_block(" Book Detail (↑↓ scroll, E edit, Esc close) ", Color::Cyan);

    let Some(book) = detail else {
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(loading, popup_area);
        return;
    };

    let widget = Paragraph::new(detail_lines(book))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(block);
    frame.render_widget(widget, popup_area);
}

fn detail_lines(book: &BookDetail) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:>12}  ", name), label),
            Span::raw(value),
        ])
    };
    let optional = |value: &Option<String>| value.clone().filter(|v| !v.is_empty()).unwrap_or_else(|| "-".into());

    let mut lines = vec![
        Line::from(Span::styled(
            book.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("ID", book.book_manage_id.clone()),
        field("ISBN", book.isbn.clone()),
        field("Author", book.author_name().to_string()),
        field("Price", book.price.map(format_price).unwrap_or_else(|| "-".into())),
        field("Quantity", book.quantity.to_string()),
        field("Pages", book.page_count.map(|n| n.to_string()).unwrap_or_else(|| "-".into())),
        field("Dimensions", optional(&book.dimensions)),
        field("Weight", book.weight.map(|w| format!("{}g", w)).unwrap_or_else(|| "-".into())),
        field("Cover", if book.cover_image.is_empty() { "-".into() } else { book.cover_image.clone() }),
        field("Publisher", optional(&book.publisher_image)),
        field("Created", format_timestamp(&book.created)),
        field("Modified", format_timestamp(&book.modified)),
    ];

    for (heading, body) in [
        ("Description", &book.description),
        ("Introduction", &book.introduction),
        ("Contents", &book.table_of_contents),
    ] {
        if let Some(body) = body.as_deref().filter(|b| !b.trim().is_empty()) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                heading.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.extend(body.lines().map(|l| Line::from(l.to_string())));
        }
    }

    lines
}

pub fn render_add_book(frame: &mut Frame, url: &str, scraping: bool) {
    let popup_area = popup_area(frame.area(), 70, 7);
    frame.render_widget(Clear, popup_area);

    let input = if url.is_empty() {
        Span::styled("Paste a bookstore URL...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(url.to_string(), Style::default().fg(Color::White))
    };
    let hint = if scraping {
        Span::styled("⏳ Requesting scrape...", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            "Enter: scrape   Tab: enter manually   Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )
    };

    let widget = Paragraph::new(vec![
        Line::from(Span::styled("URL", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))),
        Line::from(input),
        Line::from(""),
        Line::from(hint),
    ])
    .wrap(Wrap { trim: false })
    .block(popup_block(" Add Book ", Color::Cyan));
    frame.render_widget(widget, popup_area);
}

pub fn render_book_form(frame: &mut Frame, form: &BookForm) {
    let area = frame.area();
    let popup_area = popup_area(area, 76, FormField::ALL.len() as u16 + 6);
    frame.render_widget(Clear, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Fields
            Constraint::Length(3), // Status
        ])
        .split(popup_area);

    let value_width = chunks[0].width.saturating_sub(4 + 18) as usize;
    let items: Vec<ListItem> = FormField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let is_selected = i == form.selected;
            let value = match field {
                FormField::Author => form.author_display().to_string(),
                FormField::CoverImage if !form.is_edit() => "(after the book is created)".to_string(),
                _ => form.value(*field).to_string(),
            };
            let cursor = if is_selected && form.accepts(*field) { "▏" } else { "" };
            let style = if is_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!(
                "{:>16}  {}{}",
                field.label(),
                truncate_string(&value, value_width).trim_end(),
                cursor
            ))
            .style(style)
        })
        .collect();

    render_scrollable_list(
        frame,
        chunks[0],
        items,
        form.selected,
        popup_block(form.title(), Color::Cyan).borders(Borders::LEFT | Borders::RIGHT | Borders::TOP),
    );

    let status = if form.submitting {
        Span::styled("⏳ Saving...", Style::default().fg(Color::Yellow))
    } else if let Some(error) = &form.validation_error {
        Span::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
        Span::styled(
            "Ctrl+S: save   Esc: cancel   Image fields take a file path",
            Style::default().fg(Color::DarkGray),
        )
    };
    let status = Paragraph::new(Line::from(status)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Black)),
    );
    frame.render_widget(status, chunks[1]);

    if let Some(picker) = &form.author_picker {
        render_author_picker(frame, picker);
    }
}

fn render_author_picker(frame: &mut Frame, picker: &AuthorPicker) {
    let area = frame.area();
    let popup_area = popup_area(area, 50, 16);
    frame.render_widget(Clear, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Name input
            Constraint::Min(0),    // Results
        ])
        .split(popup_area);

    let input = Paragraph::new(format!("{}▏", picker.input))
        .style(Style::default().fg(Color::White))
        .block(popup_block(" Author (Tab search, Ctrl+N create) ", Color::Cyan));
    frame.render_widget(input, chunks[0]);

    let block = popup_block(" Results (↑↓ Enter Esc) ", Color::Cyan);
    if picker.loading || picker.authors.is_empty() {
        let text = if picker.loading { "Searching..." } else { "No authors found." };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = picker
        .authors
        .iter()
        .enumerate()
        .map(|(i, author)| {
            let style = if i == picker.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(author.name.clone()).style(style)
        })
        .collect();

    render_scrollable_list(frame, chunks[1], items, picker.selected, block);
}
