use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use libradmin_core::models::Book;
use libradmin_core::utils::truncate_string;

use crate::app::App;
use crate::ui::styles;

use super::panel;

/// Render the book catalogue: search line, table, and the selected book
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(6)])
        .split(area);

    render_search_line(frame, app, chunks[0]);
    render_book_table(frame, app, chunks[1]);
    render_book_detail(frame, app.books.visible().get(app.books.selection), chunks[2]);
}

fn render_search_line(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.books;
    let line = if view.editing_search {
        Line::from(vec![
            Span::styled(format!(" Search by {}: ", view.search_field.label()), styles::search_style()),
            Span::styled(format!("{}▌", view.search_input), styles::list_item_style()),
        ])
    } else if let Some((field, ref query)) = view.search {
        Line::from(vec![
            Span::styled(format!(" Results for {} \"{}\"  ", field.label(), query), styles::search_style()),
            Span::styled("[c] clear", styles::muted_style()),
        ])
    } else if let Some(ref error) = view.error {
        Line::from(Span::styled(format!(" {}", error), styles::error_style()))
    } else {
        Line::from(Span::styled(
            " [/] title search  [a] author search  [+] add book  [n/p] page",
            styles::muted_style(),
        ))
    };

    frame.render_widget(
        Paragraph::new(line).block(panel(String::new(), view.editing_search)),
        area,
    );
}

fn render_book_table(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.books;
    let books = view.visible();

    let header = Row::new([
        Cell::from("ID"),
        Cell::from("Title"),
        Cell::from("Author"),
        Cell::from("Year"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = books
        .iter()
        .enumerate()
        .map(|(i, book)| {
            let style = if i == view.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(format!("{:>4}", book.book_id)),
                Cell::from(book.title.clone()),
                Cell::from(book.author_display().to_string()),
                Cell::from(book.year_display().to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Length(5),
    ];

    let title = if view.search_results.is_some() {
        format!(" Search results ({}) ", books.len())
    } else if view.search.is_some() {
        " Searching... ".to_string()
    } else {
        format!(" Books - page {} of {} ", view.page, view.total_pages)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, !view.editing_search))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select((!books.is_empty()).then_some(view.selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_book_detail(frame: &mut Frame, book: Option<&Book>, area: Rect) {
    let lines = match book {
        Some(book) => {
            let mut lines = vec![Line::from(vec![
                Span::styled(book.title.clone(), styles::highlight_style()),
                Span::styled(format!("  by {}", book.author_display()), styles::muted_style()),
            ])];
            if let Some(copies) = book.available_copies {
                lines.push(Line::from(format!("{} copies available", copies)));
            }
            if let Some(ref description) = book.description {
                let width = area.width.saturating_sub(4) as usize * 2;
                lines.push(Line::from(truncate_string(description, width)));
            }
            lines
        }
        None => vec![Line::from(Span::styled("No book selected", styles::muted_style()))],
    };

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(panel(" Details ".to_string(), false)),
        area,
    );
}
