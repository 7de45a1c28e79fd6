use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Gauge, Paragraph, Row, Table},
    Frame,
};

use libradmin_core::utils::{format_date, format_money};

use crate::app::App;
use crate::ui::styles;

use super::{form_lines, panel};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(5)])
        .split(columns[0]);

    render_availability(frame, app, left[0]);
    render_available_books(frame, app, left[1]);
    render_overdue(frame, app, columns[1]);
}

fn render_availability(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(" Availability ".to_string(), false);

    let Some(ref report) = app.reports.availability else {
        let text = match app.reports.error {
            Some(ref error) => Span::styled(format!(" {}", error), styles::error_style()),
            None => Span::styled(" Loading...", styles::muted_style()),
        };
        frame.render_widget(Paragraph::new(Line::from(text)).block(block), area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(inner);

    let lines = vec![
        Line::from(vec![
            Span::styled(" Total:     ", styles::muted_style()),
            Span::raw(report.total_books.to_string()),
        ]),
        Line::from(vec![
            Span::styled(" Borrowed:  ", styles::muted_style()),
            Span::raw(report.total_borrowed_books.to_string()),
        ]),
        Line::from(vec![
            Span::styled(" Available: ", styles::muted_style()),
            Span::styled(report.total_available_books.to_string(), styles::success_style()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), rows[0]);

    let percent = report.borrowed_percent();
    let gauge = Gauge::default()
        .gauge_style(styles::highlight_style())
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}% on loan", percent));
    frame.render_widget(gauge, rows[1]);
}

fn render_available_books(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.reports;
    let lines: Vec<Line> = if view.available.is_empty() {
        vec![Line::from(Span::styled(" Nothing to show", styles::muted_style()))]
    } else {
        view.available
            .iter()
            .map(|book| {
                Line::from(vec![
                    Span::styled(format!(" {:>4}  ", book.book_id), styles::muted_style()),
                    Span::raw(book.title.clone()),
                    Span::styled(format!("  {}", book.author_display()), styles::muted_style()),
                ])
            })
            .collect()
    };

    let title = format!(
        " Available to borrow - page {} of {} [n/p] ",
        view.page, view.total_pages
    );
    frame.render_widget(Paragraph::new(lines).block(panel(title, false)), area);
}

fn render_overdue(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.reports;
    let editing = view.lookup.editing;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(4)])
        .split(area);

    let mut lines = form_lines(&view.lookup, editing);
    if !editing {
        lines.push(Line::from(Span::styled("  [u] enter a user id", styles::muted_style())));
    }
    frame.render_widget(
        Paragraph::new(lines).block(panel(" Overdue loans ".to_string(), editing)),
        chunks[0],
    );

    let title = match view.requested_user {
        Some(id) => format!(" User {} ", id),
        None => " No user selected ".to_string(),
    };

    let Some(ref report) = view.overdue else {
        let text = match (&view.error, view.requested_user) {
            (Some(error), _) => Span::styled(format!(" {}", error), styles::error_style()),
            (None, Some(_)) => Span::styled(" Loading...", styles::muted_style()),
            (None, None) => Span::styled(" Look up a user to see overdue loans", styles::muted_style()),
        };
        frame.render_widget(Paragraph::new(Line::from(text)).block(panel(title, false)), chunks[1]);
        return;
    };

    let header = Row::new([
        Cell::from("Loan"),
        Cell::from("Book"),
        Cell::from("Due"),
        Cell::from("Days"),
        Cell::from("Fine"),
    ])
    .style(styles::title_style());

    let rows: Vec<Row> = report
        .overdue_items
        .iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(item.loan_id.to_string()),
                Cell::from(item.book_title.clone()),
                Cell::from(item.due_date.as_deref().map(format_date).unwrap_or_default()),
                Cell::from(format!("{:>4}", item.days_overdue)),
                Cell::from(format_money(item.fine_amount)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(3),
        Constraint::Length(13),
        Constraint::Length(5),
        Constraint::Length(9),
    ];

    let title = format!("{}- total fine {} ", title, format_money(report.total_fine));
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, false));
    frame.render_widget(table, chunks[1]);
}
