//! Admin passkey prompt, drawn as a modal over the current screen.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use zeroize::Zeroizing;

use crate::application::PASSKEY_LENGTH;
use crate::tui::styles::CareTheme;

/// Input buffer and last error of the passkey prompt.
#[derive(Default)]
pub struct PasskeyState {
    pub input: Zeroizing<String>,
    pub error: Option<String>,
}

impl PasskeyState {
    pub fn input_char(&mut self, c: char) {
        if self.input.chars().count() < PASSKEY_LENGTH && !c.is_whitespace() {
            self.input.push(c);
        }
    }

    pub fn delete_char(&mut self) {
        self.input.pop();
    }

    /// Drop the typed key and any error.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn render_passkey_modal(f: &mut Frame, area: Rect, state: &PasskeyState) {
    let popup = super::centered_rect(52, 9, area);
    f.render_widget(Clear, popup);

    let typed = state.input.chars().count();
    let slots = (0..PASSKEY_LENGTH)
        .map(|i| if i < typed { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = vec![
        Line::from(Span::styled(
            "To access the admin page, please enter the passkey.",
            CareTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(slots, CareTheme::focused())),
        Line::from(""),
    ];
    match &state.error {
        Some(error) => lines.push(Line::from(Span::styled(error.clone(), CareTheme::danger()))),
        None => lines.push(Line::from(vec![
            Span::styled("[Enter] ", CareTheme::key_hint()),
            Span::styled("Enter admin panel  ", CareTheme::key_desc()),
            Span::styled("[Esc] ", CareTheme::key_hint()),
            Span::styled("Close", CareTheme::key_desc()),
        ])),
    }

    let block = Block::default()
        .title(Span::styled(" Admin Access Verification ", CareTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(CareTheme::border_focused());

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        popup,
    );
}
