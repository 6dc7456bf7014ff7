//! UI module: View components for the TUI.

pub mod admin;
pub mod form;
pub mod passkey;
pub mod success;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::CareTheme;

/// Key hints along the bottom edge, or a status message when one is set.
pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    hints: &[(&str, &str)],
    message: Option<&str>,
) {
    let line = match message {
        Some(message) => Line::from(vec![
            Span::styled("! ", CareTheme::danger()),
            Span::styled(message.to_string(), CareTheme::danger()),
        ]),
        None => Line::from(
            hints
                .iter()
                .flat_map(|(key, desc)| {
                    [
                        Span::styled(format!("[{key}] "), CareTheme::key_hint()),
                        Span::styled(format!("{desc}  "), CareTheme::key_desc()),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(CareTheme::border());

    f.render_widget(
        Paragraph::new(line).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// Single-line brand header with a page title.
pub fn render_header(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" CarePulse", CareTheme::subtitle()),
        Span::styled(" │ ", CareTheme::text_muted()),
        Span::styled(title.to_string(), CareTheme::title()),
        Span::styled(format!("  {subtitle}"), CareTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(CareTheme::border()),
    );

    f.render_widget(header, area);
}

/// A rectangle of `width` x `height` centered in `area`.
#[must_use]
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width.min(area.width)),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}
