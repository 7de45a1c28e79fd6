use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::ui::styles;

use super::panel;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    let total_books = app.dashboard.total_books.map(|n| n.to_string());
    let total_users = app.dashboard.total_users.map(|n| n.to_string());
    render_card(frame, cards[0], "Books in catalogue", total_books);
    render_card(frame, cards[1], "Registered users", total_users);

    let mut lines = vec![Line::from("")];
    if let Some(ref error) = app.dashboard.error {
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("  [2] ", styles::help_key_style()),
        Span::styled("Browse and search books", styles::help_desc_style()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  [5] ", styles::help_key_style()),
        Span::styled("Lend or take back a book", styles::help_desc_style()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  [6] ", styles::help_key_style()),
        Span::styled("Availability and overdue reports", styles::help_desc_style()),
    ]));

    frame.render_widget(
        Paragraph::new(lines).block(panel(" Overview ".to_string(), false)),
        chunks[1],
    );
}

fn render_card(frame: &mut Frame, area: Rect, label: &str, value: Option<String>) {
    let value = match value {
        Some(v) => Span::styled(format!("  {}", v), styles::title_style()),
        None => Span::styled("  ...", styles::muted_style()),
    };
    let lines = vec![
        Line::from(""),
        Line::from(value),
        Line::from(Span::styled(format!("  {}", label), styles::muted_style())),
    ];
    frame.render_widget(Paragraph::new(lines).block(panel(String::new(), false)), area);
}
