//! Affection meters for the sidebar

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use sakura_core::{Affection, Character, CharacterId};

use crate::ui::theme::GameTheme;

/// Score at which a meter reads full
const METER_SCALE: f64 = 100.0;

/// One meter per heroine, with the current speaker highlighted
pub struct AffectionPanelWidget<'a> {
    characters: &'a [Character],
    affection: &'a Affection,
    active: Option<CharacterId>,
    theme: &'a GameTheme,
}

impl<'a> AffectionPanelWidget<'a> {
    pub fn new(characters: &'a [Character], affection: &'a Affection, theme: &'a GameTheme) -> Self {
        Self {
            characters,
            affection,
            active: None,
            theme,
        }
    }

    pub fn active(mut self, id: Option<CharacterId>) -> Self {
        self.active = id;
        self
    }
}

impl Widget for AffectionPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Affection ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut constraints: Vec<Constraint> =
            self.characters.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Min(0));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (character, row) in self.characters.iter().zip(rows.iter()) {
            let score = self.affection.get(character.id);
            let color = self.theme.character_color(character.id);

            let mut name_style = Style::default().fg(color);
            if self.active == Some(character.id) {
                name_style = name_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            let portrait = if character.image.is_some() { "✿" } else { "·" };

            let [name_area, meter_area] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Length(1)])
                .areas(*row);

            Paragraph::new(Line::from(vec![
                Span::styled(format!("{portrait} "), Style::default().fg(color)),
                Span::styled(character.name.clone(), name_style),
            ]))
            .render(name_area, buf);

            Gauge::default()
                .gauge_style(Style::default().fg(self.theme.affection_color(score)))
                .ratio((score.max(0) as f64 / METER_SCALE).min(1.0))
                .label(format!("♥ {score}"))
                .render(meter_area, buf);
        }
    }
}
