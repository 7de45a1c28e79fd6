use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

use super::{form_lines, push_feedback, render_dialog};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        "  Sign in to manage the library",
        styles::highlight_style(),
    ))];
    lines.push(Line::from(""));
    lines.extend(form_lines(&app.login.form, true));
    push_feedback(&mut lines, app.login.error.as_deref(), None);

    render_dialog(frame, area, "Login", lines, 60);
}
