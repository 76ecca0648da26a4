//! Catalog list rendering

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{format_price, ActiveSection, BookSummary, CatalogFeed, FetchState, UiState};
use super::utils::{calculate_book_column_widths, render_scrollable_list, truncate_string};

pub fn render_catalog(frame: &mut Frame, area: Rect, ui_state: &UiState, feed: &CatalogFeed) {
    let is_focused = ui_state.active_section == ActiveSection::Catalog;
    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Catalog ")
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    if feed.is_empty() {
        let (text, color) = match feed.fetch_state() {
            FetchState::LoadingInitial => ("Loading...".to_string(), Color::Yellow),
            FetchState::Error => (
                format!(
                    "Failed to load books: {}\n\nPress R to retry",
                    feed.error().unwrap_or("unknown error")
                ),
                Color::Red,
            ),
            _ => ("No books found.".to_string(), Color::DarkGray),
        };
        let placeholder = Paragraph::new(text).style(Style::default().fg(color)).block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let (num_width, title_width, author_width, price_width, quantity_width) =
        calculate_book_column_widths(content_width, feed.len());

    let mut items: Vec<ListItem> = feed
        .records()
        .enumerate()
        .map(|(i, book)| {
            let is_selected = i == ui_state.catalog_selected;
            let deleting = ui_state.pending_deletes.contains(&book.id);
            book_row(
                i,
                book,
                deleting,
                (num_width, title_width, author_width, price_width, quantity_width),
            )
            .style(row_style(is_selected, is_focused, deleting))
        })
        .collect();

    // Footer row for incremental loading
    match feed.fetch_state() {
        FetchState::LoadingMore => items.push(
            ListItem::new(format!("{:>width$}⏳ Loading more books...", "", width = num_width + 4))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)),
        ),
        FetchState::Error => items.push(
            ListItem::new(format!(
                "{:>width$}⚠ {} (scroll down to retry)",
                "",
                feed.error().unwrap_or("Failed to load more"),
                width = num_width + 4
            ))
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC)),
        ),
        _ if feed.has_more() => items.push(
            ListItem::new(format!("{:>width$}↓ Scroll down for more books...", "", width = num_width + 4))
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)),
        ),
        _ => {}
    }

    render_scrollable_list(frame, area, items, ui_state.catalog_selected, block);
}

fn book_row(
    index: usize,
    book: &BookSummary,
    deleting: bool,
    (num_width, title_width, author_width, price_width, quantity_width): (usize, usize, usize, usize, usize),
) -> ListItem<'static> {
    let price = book.price.map(format_price).unwrap_or_else(|| "-".to_string());
    let marker = if deleting { "✗" } else { " " };
    ListItem::new(format!(
        "{}{:>num_width$}   {}   {}   {:>price_width$}   {:>quantity_width$}",
        marker,
        index + 1,
        truncate_string(&book.title, title_width),
        truncate_string(book.author_name(), author_width),
        price,
        format!("x{}", book.quantity),
    ))
}

fn row_style(is_selected: bool, is_focused: bool, deleting: bool) -> Style {
    if deleting {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else if is_selected && is_focused {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if is_selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}
