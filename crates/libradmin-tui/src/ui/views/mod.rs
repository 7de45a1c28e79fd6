//! Content rendering for each route.

pub mod add_book;
pub mod books;
pub mod dashboard;
pub mod login;
pub mod reports;
pub mod signup;
pub mod transactions;
pub mod users;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::form::Form;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Width of the value column of a form field
const FIELD_WIDTH: usize = 30;

/// Lines for a form: one per field, then the buttons on a single row.
/// The cursor is only drawn while `active`.
pub fn form_lines(form: &Form, active: bool) -> Vec<Line<'static>> {
    let label_width = form
        .fields
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let focused = active && form.focused_field() == Some(i);
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };

        // Keep the tail of long values visible
        let value = field.display_value();
        let count = value.chars().count();
        let shown: String = value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect();

        let mut spans = vec![
            Span::styled(
                format!("  {:>width$}: [", field.label, width = label_width),
                styles::muted_style(),
            ),
            Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
            Span::styled("]", styles::muted_style()),
        ];
        if let Some(hint) = field.hint {
            if focused {
                spans.push(Span::styled(format!(" {}", hint), styles::muted_style()));
            }
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    let mut buttons = vec![Span::raw("  ")];
    for (i, label) in form.buttons.iter().enumerate() {
        let focused = active && form.focused_button() == Some(i);
        if focused {
            buttons.push(Span::styled(format!("[ ▶ {} ◀ ]", label), styles::selected_style()));
        } else {
            buttons.push(Span::styled(format!("[   {}   ]", label), styles::list_item_style()));
        }
        buttons.push(Span::raw("  "));
    }
    lines.push(Line::from(buttons));
    lines
}

/// Append an error or success line when present
pub fn push_feedback(lines: &mut Vec<Line<'static>>, error: Option<&str>, success: Option<&str>) {
    if let Some(error) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    } else if let Some(success) = success {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", success), styles::success_style())));
    }
}

/// Render a form as a centered dialog, as the login and signup views do
pub fn render_dialog(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    mut lines: Vec<Line<'static>>,
    width: u16,
) {
    lines.insert(0, Line::from(""));
    let height = lines.len() as u16 + 3;
    let dialog = centered_rect_fixed(width, height, area);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

/// A bordered block titled like every other panel
pub fn panel(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}
