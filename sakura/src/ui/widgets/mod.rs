//! TUI widgets for Sakura Memories

pub mod affection_panel;
pub mod choices;
pub mod dialogue;
pub mod input;

pub use affection_panel::AffectionPanelWidget;
pub use choices::ChoicesWidget;
pub use dialogue::DialogueWidget;
pub use input::InputWidget;
