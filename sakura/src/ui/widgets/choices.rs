//! Numbered choice list widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use sakura_core::Choice;

use crate::ui::theme::GameTheme;

/// The player's options for the current scene
pub struct ChoicesWidget<'a> {
    choices: &'a [Choice],
    selected: usize,
    theme: &'a GameTheme,
}

impl<'a> ChoicesWidget<'a> {
    pub fn new(choices: &'a [Choice], theme: &'a GameTheme) -> Self {
        Self {
            choices,
            selected: 0,
            theme,
        }
    }

    pub fn selected(mut self, index: usize) -> Self {
        self.selected = index;
        self
    }
}

impl Widget for ChoicesWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" What will you do? ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(true));

        let lines: Vec<Line> = self
            .choices
            .iter()
            .enumerate()
            .map(|(i, choice)| {
                let selected = i == self.selected;
                let marker = if selected { "▸" } else { " " };
                Line::from(Span::styled(
                    format!("{marker} {}. {}", i + 1, choice.text),
                    self.theme.choice_style(selected),
                ))
            })
            .collect();

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
