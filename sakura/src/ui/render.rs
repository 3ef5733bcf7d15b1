//! Render orchestration for the Sakura TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use sakura_core::{Alert, GameState, LoadingStatus};

use crate::app::App;
use crate::ui::layout::{centered_rect_fixed, PlayLayout};
use crate::ui::theme::GameTheme;
use crate::ui::widgets::{AffectionPanelWidget, ChoicesWidget, DialogueWidget, InputWidget};

const TITLE: &str = "Sakura Memories";
const SUBTITLE: &str = "櫻花回憶 · a school romance written by AI";
const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Overlay types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
    History,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.state() {
        GameState::Menu => render_menu(frame, app, area),
        GameState::Loading => {
            let status = LoadingStatus {
                message: app.session.loading_message().to_string(),
                characters: app.session.characters().to_vec(),
            };
            render_loading(frame, &app.theme, &status, app.animation_frame);
        }
        GameState::Playing => render_playing(frame, app, area),
        GameState::Ending => render_ending(frame, app, area),
    }

    if let Some(overlay) = app.overlay() {
        match overlay {
            Overlay::Help => render_help_overlay(frame, app, area),
            Overlay::History => render_history_overlay(frame, app, area),
        }
    }

    if let Some(alert) = app.alert() {
        render_alert(frame, &app.theme, alert, area);
    }
}

/// Render the title screen with the name field
fn render_menu(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(52, 13, area);

    let [title_area, input_area, hint_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .areas(popup);

    let title = vec![
        Line::from(""),
        Line::from(Span::styled(format!("✿ {TITLE} ✿"), app.theme.title_style())),
        Line::from(""),
        Line::from(Span::styled(SUBTITLE, app.theme.system_style())),
    ];
    frame.render_widget(
        Paragraph::new(title).alignment(Alignment::Center),
        title_area,
    );

    let input = InputWidget::new(app.name_input(), &app.theme)
        .cursor_position(app.cursor_position())
        .title("Your name")
        .placeholder("Type your name...");
    frame.render_widget(input, input_area);

    let mut hint = vec![Line::from(Span::styled(
        "Enter to begin · Esc to quit",
        app.theme.system_style(),
    ))];
    if let Some(message) = app.status_message() {
        hint.push(Line::from(Span::styled(message, app.theme.alert_style())));
    }
    frame.render_widget(
        Paragraph::new(hint).alignment(Alignment::Center),
        hint_area,
    );
}

/// Render the loading screen.
///
/// Takes the theme and status directly so it can be drawn while the
/// session is busy with a narrator call.
pub fn render_loading(frame: &mut Frame, theme: &GameTheme, status: &LoadingStatus, tick: u8) {
    let area = frame.area();
    let popup = centered_rect_fixed(48, 9 + status.characters.len() as u16, area);

    let spinner = SPINNER[tick as usize % SPINNER.len()];
    let message = if status.message.is_empty() {
        "Loading..."
    } else {
        status.message.as_str()
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("{spinner} {message}"), theme.title_style())),
        Line::from(""),
    ];

    for character in &status.characters {
        let color = theme.character_color(character.id);
        let (mark, style) = if character.image.is_some() {
            ("✿", Style::default().fg(color))
        } else {
            ("·", theme.system_style())
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{mark} "), Style::default().fg(color)),
            Span::styled(character.name.clone(), style),
        ]));
    }

    let block = Block::default()
        .title(format!(" {TITLE} "))
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        popup,
    );
}

/// Render a scene with its choices
fn render_playing(frame: &mut Frame, app: &App, area: Rect) {
    let Some(scene) = app.session.current_scene() else {
        return;
    };
    let layout = PlayLayout::calculate(area, scene.choices.len());

    // Title bar with the turn badge
    let title = Line::from(vec![
        Span::styled(format!(" {TITLE} "), app.theme.title_style()),
        Span::raw("│ "),
        Span::raw(app.session.player_name().to_string()),
        Span::raw(" │ "),
        Span::styled(
            format!("Turn {}", app.session.turn_label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), layout.title_area);

    let active = app.session.active_character();
    let panel = AffectionPanelWidget::new(
        app.session.characters(),
        app.session.affection(),
        &app.theme,
    )
    .active(active.map(|c| c.id));
    frame.render_widget(panel, layout.sidebar_area);

    let speaker_name = active.map(|c| c.name.as_str()).unwrap_or("");
    frame.render_widget(
        DialogueWidget::new(scene, &app.theme).speaker_name(speaker_name),
        layout.dialogue_area,
    );

    frame.render_widget(
        ChoicesWidget::new(&scene.choices, &app.theme).selected(app.selected_choice),
        layout.choices_area,
    );

    let hotkeys = app
        .status_message()
        .map(|m| Line::from(Span::styled(m.to_string(), app.theme.alert_style())))
        .unwrap_or_else(|| {
            Line::from(Span::styled(
                " ↑/↓ select · Enter/1-9 choose · h history · ? help · q quit",
                app.theme.system_style(),
            ))
        });
    frame.render_widget(Paragraph::new(hotkeys), layout.hotkey_bar);
}

/// Render the ending card
fn render_ending(frame: &mut Frame, app: &App, area: Rect) {
    let Some(card) = app.session.ending() else {
        return;
    };
    let popup = centered_rect_fixed(70, 20, area);
    let color = app.theme.character_color(card.character);

    let heroine = app
        .session
        .character(card.character)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| card.character.to_string());

    let mut lines = vec![
        Line::from(Span::styled(
            card.ending.ending_title.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!("with {heroine}"), app.theme.system_style())),
        Line::from(""),
    ];
    lines.extend(
        card.ending
            .ending_text
            .lines()
            .map(|l| Line::from(l.to_string())),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter to return to the title screen · h history · q quit",
        app.theme.system_style(),
    )));

    let block = Block::default()
        .title(" ✿ The End ✿ ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}

/// Render the story-so-far overlay
fn render_history_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(70, 24, area);
    frame.render_widget(Clear, popup);

    let entries = app.session.history().entries();
    // Show the most recent entries that fit
    let visible = popup.height.saturating_sub(2) as usize / 2;
    let lines: Vec<Line> = entries
        .iter()
        .skip(entries.len().saturating_sub(visible))
        .flat_map(|entry| [Line::from(format!("• {entry}")), Line::from("")])
        .collect();

    let block = Block::default()
        .title(" Story so far ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(50, 14, area);
    frame.render_widget(Clear, popup);

    let heading = Style::default().add_modifier(Modifier::UNDERLINED);
    let help_text = vec![
        Line::from(Span::styled(
            format!(" {TITLE} - Help "),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Choosing:", heading)),
        Line::from("  ↑/↓ or j/k    Move the highlight"),
        Line::from("  Enter         Choose the highlighted option"),
        Line::from("  1-9           Choose an option directly"),
        Line::from(""),
        Line::from(Span::styled("Other:", heading)),
        Line::from("  h             Story so far"),
        Line::from("  q / Ctrl+C    Quit"),
        Line::from(""),
        Line::from(Span::styled("Press Esc or ? to close", app.theme.system_style())),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    frame.render_widget(
        Paragraph::new(help_text).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

/// Render a blocking alert
fn render_alert(frame: &mut Frame, theme: &GameTheme, alert: &Alert, area: Rect) {
    let popup = centered_rect_fixed(56, 7, area);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(alert.message.clone(), theme.alert_style())),
        Line::from(""),
        Line::from(Span::styled("Press Enter to continue", theme.system_style())),
    ];

    let block = Block::default()
        .title(" ! ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.alert));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}
