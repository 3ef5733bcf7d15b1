//! Input field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::GameTheme;

/// Single-line text input with a visible cursor
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a GameTheme,
    title: Option<&'a str>,
    placeholder: &'a str,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a GameTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            title: None,
            placeholder: "",
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true));
        if let Some(title) = self.title {
            block = block.title(format!(" {title} "));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let cursor_style = Style::default()
            .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
            .fg(self.theme.accent);

        let line = if self.content.is_empty() {
            Line::from(vec![
                Span::styled(" ", cursor_style),
                Span::styled(
                    self.placeholder,
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        } else {
            // Character-based slicing keeps multi-byte names intact
            let before_cursor: String = self.content.chars().take(self.cursor_position).collect();
            let at_cursor = self
                .content
                .chars()
                .nth(self.cursor_position)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after_cursor: String = self
                .content
                .chars()
                .skip(self.cursor_position + 1)
                .collect();

            Line::from(vec![
                Span::raw(before_cursor),
                Span::styled(at_cursor, cursor_style),
                Span::raw(after_cursor),
            ])
        };

        Paragraph::new(line).render(inner, buf);
    }
}
