//! Layout calculations for the Sakura TUI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the playing screen
pub struct PlayLayout {
    pub title_area: Rect,
    pub sidebar_area: Rect,
    pub dialogue_area: Rect,
    pub choices_area: Rect,
    pub hotkey_bar: Rect,
}

impl PlayLayout {
    /// Calculate layout based on terminal size and number of choices
    pub fn calculate(area: Rect, choice_count: usize) -> Self {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(8),    // Main content
                Constraint::Length(1), // Hotkey bar
            ])
            .split(area);

        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(30)])
            .split(main_chunks[1]);

        // One line per choice plus the border
        let choices_height = (choice_count as u16).saturating_add(2).max(3);
        let story_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(choices_height)])
            .split(content_chunks[1]);

        Self {
            title_area: main_chunks[0],
            sidebar_area: content_chunks[0],
            dialogue_area: story_chunks[0],
            choices_area: story_chunks[1],
            hotkey_bar: main_chunks[2],
        }
    }
}

/// Calculate centered popup area with fixed size
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed_clamps() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = centered_rect_fixed(60, 6, area);
        assert_eq!(popup, Rect::new(0, 2, 40, 6));
    }

    #[test]
    fn test_choices_area_fits_choices() {
        let layout = PlayLayout::calculate(Rect::new(0, 0, 100, 30), 3);
        assert_eq!(layout.choices_area.height, 5);
        assert_eq!(layout.title_area.height, 1);
        assert_eq!(layout.sidebar_area.width, 30);
    }
}
