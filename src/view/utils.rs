//! Utility functions for rendering UI components

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    selected_index: usize,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Centered popup of at most `width` x `height`, leaving a margin around the screen
pub fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Calculate width needed for index column (log10(n) + padding)
pub fn calculate_num_width(item_count: usize) -> usize {
    if item_count == 0 {
        2
    } else {
        let digits = (item_count as f64).log10().floor() as usize + 1;
        digits + 1
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

/// Calculate column widths for the book list
/// Returns (num_width, title_width, author_width, price_width, quantity_width)
pub fn calculate_book_column_widths(content_width: usize, item_count: usize) -> (usize, usize, usize, usize, usize) {
    // Format: " {num}   {title}   {author}   {price}   {qty}"
    let num_width = calculate_num_width(item_count);
    let price_width = 12;
    let quantity_width = 6;
    let fixed_width = 1 + num_width + 3 + 3 + 3 + price_width + 3 + quantity_width;
    let remaining_width = content_width.saturating_sub(fixed_width);
    let title_width = (remaining_width * 60) / 100;
    let author_width = remaining_width.saturating_sub(title_width);

    (num_width, title_width, author_width, price_width, quantity_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Dune", 8, "Dune    ")]
    #[case("The Left Hand of Darkness", 10, "The Lef...")]
    fn strings_are_padded_or_cut(#[case] input: &str, #[case] width: usize, #[case] expected: &str) {
        assert_eq!(truncate_string(input, width), expected);
    }

    #[rstest]
    #[case(0, 2)]
    #[case(9, 2)]
    #[case(10, 3)]
    #[case(120, 4)]
    fn index_column_fits_the_largest_number(#[case] count: usize, #[case] expected: usize) {
        assert_eq!(calculate_num_width(count), expected);
    }

    #[rstest]
    fn popup_stays_inside_the_screen() {
        let screen = Rect::new(0, 0, 40, 12);
        let popup = popup_area(screen, 80, 30);
        assert_eq!(popup, Rect::new(2, 2, 36, 8));
    }
}
