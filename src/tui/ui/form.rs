//! Generic form renderer.
//!
//! Draws every field of a [`FormSession`] as a bordered box, scrolled so the
//! selected field stays visible. Field errors appear on the bottom border
//! once the form session decides they should be shown.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::application::FormSession;
use crate::domain::{FieldKind, FieldSpec};
use crate::tui::styles::CareTheme;

const FIELD_HEIGHT: u16 = 3;

/// Render a form session inside a titled panel.
pub fn render_form(f: &mut Frame, area: Rect, title: &str, form: &FormSession) {
    let mut title_spans = vec![Span::styled(format!(" {title} "), CareTheme::subtitle())];
    if form.is_busy() {
        title_spans.push(Span::styled("Submitting… ", CareTheme::info()));
    }
    let panel = Block::default()
        .title(Line::from(title_spans))
        .borders(Borders::ALL)
        .border_style(CareTheme::border());
    let inner = panel.inner(area);
    f.render_widget(panel, area);

    let fields = form.schema().fields();
    if fields.is_empty() || inner.height < FIELD_HEIGHT {
        return;
    }

    let visible = usize::from(inner.height / FIELD_HEIGHT).max(1);
    let (start, end) = scroll_window(form.selected(), fields.len(), visible);

    let constraints: Vec<Constraint> = (start..end)
        .map(|_| Constraint::Length(FIELD_HEIGHT))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (row, index) in (start..end).enumerate() {
        let spec = &fields[index];
        render_field(f, rows[row], form, spec, index == form.selected());
    }
}

/// First and one-past-last field index to draw.
fn scroll_window(selected: usize, len: usize, visible: usize) -> (usize, usize) {
    if len <= visible {
        return (0, len);
    }
    let start = selected.saturating_sub(visible - 1).min(len - visible);
    (start, start + visible)
}

fn render_field(f: &mut Frame, area: Rect, form: &FormSession, spec: &FieldSpec, selected: bool) {
    let error = form.visible_error(spec.name);

    let border_style = match (&error, selected) {
        (Some(_), _) => CareTheme::border_error(),
        (None, true) => CareTheme::border_focused(),
        (None, false) => CareTheme::border(),
    };
    let label_style = if selected {
        CareTheme::focused()
    } else {
        CareTheme::text_secondary()
    };
    let marker = if spec.required { " *" } else { "" };

    let mut block = Block::default()
        .title(Span::styled(format!(" {}{marker} ", spec.label), label_style))
        .borders(Borders::ALL)
        .border_style(border_style);
    if !spec.section.is_empty() {
        block = block.title_top(
            Line::styled(format!(" {} ", spec.section), CareTheme::text_muted()).right_aligned(),
        );
    }
    if let Some(error) = error {
        block = block.title_bottom(Line::styled(format!(" {error} "), CareTheme::danger()));
    }

    let value = form.display_value(spec);
    let mut spans = vec![Span::raw(" ")];
    match &spec.kind {
        FieldKind::Select { .. } => {
            let shown = if value.is_empty() { "Select an option" } else { value.as_str() };
            spans.push(Span::styled("‹ ", CareTheme::key_hint()));
            spans.push(Span::styled(shown.to_string(), CareTheme::text()));
            spans.push(Span::styled(" ›", CareTheme::key_hint()));
        }
        FieldKind::Checkbox { .. } => {
            spans.push(Span::styled(value, CareTheme::focused()));
            spans.push(Span::styled(" (space)", CareTheme::text_muted()));
        }
        _ if value.is_empty() => {
            spans.push(Span::styled(spec.placeholder, CareTheme::text_muted()));
        }
        _ => spans.push(Span::styled(value, CareTheme::text())),
    }
    if selected && spec.kind.is_typed() {
        spans.push(Span::styled("▌", CareTheme::cursor()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
