//! Dialogue box widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use sakura_core::Scene;

use crate::ui::theme::GameTheme;

/// Name plate and text of the current scene
pub struct DialogueWidget<'a> {
    scene: &'a Scene,
    speaker_name: &'a str,
    theme: &'a GameTheme,
}

impl<'a> DialogueWidget<'a> {
    pub fn new(scene: &'a Scene, theme: &'a GameTheme) -> Self {
        Self {
            scene,
            speaker_name: "",
            theme,
        }
    }

    /// Display name for the speaker, e.g. "Yuki (雪)"
    pub fn speaker_name(mut self, name: &'a str) -> Self {
        self.speaker_name = name;
        self
    }
}

impl Widget for DialogueWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let speaker = self.scene.speaker;
        let name = if self.speaker_name.is_empty() {
            speaker.to_string()
        } else {
            self.speaker_name.to_string()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {name} "), self.theme.speaker_style(speaker)))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let text_style = self.theme.dialogue_style(speaker);
        let lines: Vec<Line> = self
            .scene
            .dialogue
            .lines()
            .map(|line| Line::from(Span::styled(line.to_string(), text_style)))
            .collect();

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
