use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, TransactionPanel};
use crate::ui::styles;

use super::{form_lines, panel, push_feedback};

/// Borrow and return forms side by side; the active one takes keys
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.transaction;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(4)])
        .split(area);
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[0]);

    for (panel_kind, form, title, rect) in [
        (TransactionPanel::Borrow, &view.borrow, " [b] Borrow a book ", panels[0]),
        (TransactionPanel::Return, &view.return_form, " [t] Return a book ", panels[1]),
    ] {
        let active = view.panel == panel_kind;
        let mut lines = vec![Line::from("")];
        lines.extend(form_lines(form, active && form.editing));
        frame.render_widget(
            Paragraph::new(lines).block(panel(title.to_string(), active)),
            rect,
        );
    }

    let mut lines = Vec::new();
    push_feedback(&mut lines, view.error.as_deref(), view.success.as_deref());
    if lines.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Enter submits the active form, Esc stops editing",
            styles::muted_style(),
        )));
    }
    frame.render_widget(Paragraph::new(lines), chunks[1]);
}
