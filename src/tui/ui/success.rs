//! Appointment request confirmation.

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::application::Confirmation;
use crate::tui::styles::CareTheme;

pub fn render_success(f: &mut Frame, area: Rect, confirmation: Option<&Confirmation>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(CareTheme::border());

    let Some(confirmation) = confirmation else {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("Appointment not found.", CareTheme::danger())),
        ];
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    };

    let appointment = &confirmation.appointment;
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Your ", CareTheme::title()),
            Span::styled("appointment request", CareTheme::subtitle()),
            Span::styled(" has been successfully submitted!", CareTheme::title()),
        ]),
        Line::from(Span::styled(
            "We'll be in touch shortly to confirm.",
            CareTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Requested appointment details:",
            CareTheme::text_secondary(),
        )),
    ];
    if let Some(doctor) = confirmation.doctor {
        lines.push(Line::from(vec![
            Span::styled("Dr. ", CareTheme::text_secondary()),
            Span::styled(doctor.name, CareTheme::text()),
        ]));
    }
    lines.push(Line::from(Span::styled(
        appointment.schedule.format("%B %-d, %Y - %-I:%M %p").to_string(),
        CareTheme::text(),
    )));

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}
