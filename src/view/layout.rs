//! Layout rendering (search bar, status line)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{ActiveSection, CatalogFeed, FeedQuery, FetchState, SearchField, UiState};

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState, api_url: &str) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Search input
            Constraint::Length(30), // Server
        ])
        .split(area);

    let is_focused = ui_state.active_section == ActiveSection::Search;
    let search_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    let search_text = if ui_state.search_input.is_empty() {
        Span::styled("Type to search, Enter to apply...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(ui_state.search_input.as_str(), search_style)
    };

    let field_color = match ui_state.search_field {
        SearchField::Title => Color::Yellow,
        SearchField::Author => Color::Magenta,
    };
    let field = Span::styled(
        format!("[{}] ", ui_state.search_field.label()),
        Style::default().fg(field_color).add_modifier(Modifier::BOLD),
    );

    let search = Paragraph::new(Line::from(vec![field, search_text])).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search (Tab: field) ")
            .padding(Padding::horizontal(1))
            .border_style(if is_focused {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            }),
    );
    frame.render_widget(search, chunks[0]);

    let server = Paragraph::new(api_url.to_string())
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Server "));
    frame.render_widget(server, chunks[1]);
}

/// One-line summary of the feed under the catalog
pub fn render_status_line(frame: &mut Frame, area: Rect, feed: &CatalogFeed) {
    let state = match feed.fetch_state() {
        FetchState::Idle if feed.has_more() => "more available",
        FetchState::Idle => "all loaded",
        FetchState::LoadingInitial => "loading...",
        FetchState::LoadingMore => "loading more...",
        FetchState::Error => "error",
    };

    let filter = match feed.query() {
        FeedQuery::All => "showing all books".to_string(),
        query => format!("filtered by {}", query.describe()),
    };

    let text = format!(
        " {} | {} books, {} pages | {} | h: help  q: quit",
        filter,
        feed.len(),
        feed.page_count(),
        state
    );
    let status = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, area);
}
