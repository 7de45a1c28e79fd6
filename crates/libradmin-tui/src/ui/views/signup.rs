use ratatui::{layout::Rect, Frame};

use crate::app::App;

use super::{form_lines, push_feedback, render_dialog};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = form_lines(&app.signup.form, true);
    push_feedback(&mut lines, app.signup.error.as_deref(), None);
    render_dialog(frame, area, "Create an account", lines, 64);
}
