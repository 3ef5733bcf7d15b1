//! Color theme and styling for the Sakura TUI

use ratatui::style::{Color, Modifier, Style};

use sakura_core::{CharacterId, Speaker};

/// Game UI color theme
#[derive(Debug, Clone)]
pub struct GameTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,

    // Heroine colors
    pub yuki: Color,
    pub haruka: Color,
    pub aoi: Color,

    // Affection meter colors
    pub affection_positive: Color,
    pub affection_negative: Color,

    // Text colors
    pub narrator_text: Color,
    pub choice_text: Color,
    pub choice_selected: Color,
    pub system_text: Color,
    pub alert: Color,
}

impl Default for GameTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::LightMagenta,
            accent: Color::Rgb(255, 183, 197),

            yuki: Color::LightCyan,
            haruka: Color::LightYellow,
            aoi: Color::LightGreen,

            affection_positive: Color::LightMagenta,
            affection_negative: Color::Blue,

            narrator_text: Color::Gray,
            choice_text: Color::White,
            choice_selected: Color::Rgb(255, 183, 197),
            system_text: Color::DarkGray,
            alert: Color::LightRed,
        }
    }
}

impl GameTheme {
    /// Signature color of a heroine
    pub fn character_color(&self, id: CharacterId) -> Color {
        match id {
            CharacterId::Yuki => self.yuki,
            CharacterId::Haruka => self.haruka,
            CharacterId::Aoi => self.aoi,
        }
    }

    /// Style for the speaker's name plate
    pub fn speaker_style(&self, speaker: Speaker) -> Style {
        match speaker {
            Speaker::Character(id) => Style::default()
                .fg(self.character_color(id))
                .add_modifier(Modifier::BOLD),
            Speaker::Narrator => Style::default()
                .fg(self.narrator_text)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// Style for dialogue text
    pub fn dialogue_style(&self, speaker: Speaker) -> Style {
        match speaker {
            Speaker::Character(_) => Style::default().fg(self.foreground),
            Speaker::Narrator => Style::default()
                .fg(self.narrator_text)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// Style for a choice line
    pub fn choice_style(&self, selected: bool) -> Style {
        if selected {
            Style::default()
                .fg(self.choice_selected)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.choice_text)
        }
    }

    /// Get style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn alert_style(&self) -> Style {
        Style::default().fg(self.alert).add_modifier(Modifier::BOLD)
    }

    /// Meter color for an affection score
    pub fn affection_color(&self, score: i32) -> Color {
        if score < 0 {
            self.affection_negative
        } else {
            self.affection_positive
        }
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }
}
