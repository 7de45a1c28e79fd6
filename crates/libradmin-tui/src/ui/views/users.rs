use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use libradmin_core::utils::format_phone;

use crate::app::App;
use crate::ui::styles;

use super::panel;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.users;

    if let Some(ref error) = view.error {
        let line = Line::from(Span::styled(format!(" {}", error), styles::error_style()));
        frame.render_widget(Paragraph::new(line).block(panel(" Users ".to_string(), true)), area);
        return;
    }

    let header = Row::new([
        Cell::from("ID"),
        Cell::from("Name"),
        Cell::from("Email"),
        Cell::from("Role"),
        Cell::from("Contact"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = view
        .users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == view.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let contact = user
                .contact_info
                .as_deref()
                .map(format_phone)
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(format!("{:>4}", user.user_id)),
                Cell::from(user.name.clone()),
                Cell::from(user.email.clone()),
                Cell::from(user.role_display().to_string()),
                Cell::from(contact),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(2),
        Constraint::Fill(3),
        Constraint::Length(10),
        Constraint::Fill(2),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(format!(" Users ({}) ", view.users.len()), true))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select((!view.users.is_empty()).then_some(view.selection));

    frame.render_stateful_widget(table, area, &mut state);
}
