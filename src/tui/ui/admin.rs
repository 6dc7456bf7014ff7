//! Admin dashboard: appointment counts, list and schedule/cancel forms.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::application::FormSession;
use crate::domain::schema::DATE_TIME_FORMAT;
use crate::domain::AppointmentSummary;
use crate::tui::styles::CareTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminActionKind {
    Schedule,
    Cancel,
}

/// A schedule or cancel form open for one appointment.
pub struct AdminAction {
    pub kind: AdminActionKind,
    pub appointment_id: String,
    pub form: FormSession,
}

#[derive(Default)]
pub struct AdminState {
    pub summary: AppointmentSummary,
    pub selected: usize,
    pub action: Option<AdminAction>,
    pub notice: Option<String>,
}

impl AdminState {
    pub fn select_next(&mut self) {
        let len = self.summary.appointments.len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Replace the summary, keeping the selection in range.
    pub fn load(&mut self, summary: AppointmentSummary) {
        self.selected = self
            .selected
            .min(summary.appointments.len().saturating_sub(1));
        self.summary = summary;
    }
}

pub fn render_admin(f: &mut Frame, area: Rect, state: &AdminState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    render_counts(f, chunks[0], &state.summary);
    render_table(f, chunks[1], state);

    if let Some(action) = &state.action {
        let popup = super::centered_rect(70, 18, area);
        f.render_widget(Clear, popup);
        let title = match action.kind {
            AdminActionKind::Schedule => "Schedule Appointment",
            AdminActionKind::Cancel => "Cancel Appointment",
        };
        super::form::render_form(f, popup, title, &action.form);
    }
}

fn render_counts(f: &mut Frame, area: Rect, summary: &AppointmentSummary) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let stats = [
        (summary.scheduled, "Scheduled appointments", CareTheme::success()),
        (summary.pending, "Pending appointments", CareTheme::info()),
        (summary.cancelled, "Cancelled appointments", CareTheme::danger()),
    ];

    for (card, (count, label, style)) in cards.iter().zip(stats) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(CareTheme::border());
        let lines = vec![
            Line::from(Span::styled(format!(" {count}"), style)),
            Line::from(Span::styled(
                format!(" Total number of {}", label.to_lowercase()),
                CareTheme::text_secondary(),
            )),
        ];
        f.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

fn render_table(f: &mut Frame, area: Rect, state: &AdminState) {
    let mut block = Block::default()
        .title(Span::styled(" Appointments ", CareTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(CareTheme::border());
    if let Some(notice) = &state.notice {
        block = block.title_top(
            Line::styled(format!(" {notice} "), CareTheme::success()).right_aligned(),
        );
    }

    if state.summary.appointments.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No appointments yet.",
            CareTheme::text_muted(),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(["#", "Date", "Status", "Doctor", "Reason"])
        .style(CareTheme::text_secondary());

    let rows: Vec<Row> = state
        .summary
        .appointments
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(a.schedule.format(DATE_TIME_FORMAT).to_string()),
                Cell::from(Span::styled(a.status.as_str(), CareTheme::status(a.status))),
                Cell::from(a.primary_physician.clone()),
                Cell::from(a.reason.clone()),
            ])
            .style(CareTheme::text())
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(17),
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(CareTheme::selected());

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    f.render_stateful_widget(table, area, &mut table_state);
}
