use ratatui::{layout::Rect, text::Line, widgets::Paragraph, Frame};

use crate::app::App;

use super::{form_lines, panel, push_feedback};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.add_book.form.editing;
    let mut lines = vec![Line::from("")];
    lines.extend(form_lines(&app.add_book.form, editing));
    push_feedback(&mut lines, app.add_book.error.as_deref(), None);

    frame.render_widget(
        Paragraph::new(lines).block(panel(" Add Book ".to_string(), editing)),
        area,
    );
}
