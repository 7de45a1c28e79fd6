//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use libradmin_core::auth::Route;

use crate::app::{App, AppState, SearchField, TransactionPanel, PAGE_SCROLL_SIZE};
use crate::form::{can_add_char, FormAction, MAX_FIELD_LENGTH};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Keys wait for the service to answer a submission; Ctrl+C is handled by the caller
    if app.is_submitting() {
        return Ok(false);
    }

    if app.is_editing() {
        handle_editing_input(app, key);
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some(route) = Route::navigation().nth(index) {
                app.navigate(route);
            }
        }
        KeyCode::Tab => app.navigate_relative(true),
        KeyCode::BackTab => app.navigate_relative(false),
        KeyCode::Char('l') => app.logout(),
        KeyCode::Char('r') => app.reload(),
        _ => match app.route {
            Route::Books => handle_books_input(app, key),
            Route::Users => handle_users_input(app, key),
            Route::Transaction => handle_transaction_input(app, key),
            Route::Reports => handle_reports_input(app, key),
            _ => {}
        },
    }

    Ok(false)
}

/// Keys for whichever text input currently owns the keyboard
fn handle_editing_input(app: &mut App, key: KeyEvent) {
    match app.route {
        Route::Login => match app.login.form.handle_key(key) {
            FormAction::Activate(0) => app.submit_login(),
            FormAction::Activate(_) => app.navigate(Route::Signup),
            FormAction::Cancel => app.state = AppState::ConfirmingQuit,
            FormAction::None => {}
        },
        Route::Signup => match app.signup.form.handle_key(key) {
            FormAction::Activate(0) => app.submit_signup(),
            FormAction::Activate(_) | FormAction::Cancel => app.navigate(Route::Login),
            FormAction::None => {}
        },
        Route::AddBook => match app.add_book.form.handle_key(key) {
            FormAction::Activate(0) => app.submit_add_book(),
            FormAction::Activate(_) | FormAction::Cancel => app.navigate(Route::Books),
            FormAction::None => {}
        },
        Route::Books => handle_search_input(app, key),
        Route::Transaction => match app.transaction.active_form_mut().handle_key(key) {
            FormAction::Activate(_) => match app.transaction.panel {
                TransactionPanel::Borrow => app.submit_borrow(),
                TransactionPanel::Return => app.submit_return(),
            },
            FormAction::Cancel => app.transaction.active_form_mut().editing = false,
            FormAction::None => {}
        },
        Route::Reports => match app.reports.lookup.handle_key(key) {
            FormAction::Activate(_) => app.lookup_overdue(),
            FormAction::Cancel => app.reports.lookup.editing = false,
            FormAction::None => {}
        },
        Route::Dashboard | Route::Users => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.books.editing_search = false;
            app.books.search_input.clear();
        }
        KeyCode::Enter => app.submit_book_search(),
        KeyCode::Backspace => {
            app.books.search_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_char(app.books.search_input.chars().count(), MAX_FIELD_LENGTH, c) {
                app.books.search_input.push(c);
            }
        }
        _ => {}
    }
}

fn move_selection(selection: &mut usize, len: usize, key: KeyCode) {
    let last = len.saturating_sub(1);
    *selection = match key {
        KeyCode::Up | KeyCode::Char('k') => selection.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => (*selection + 1).min(last),
        KeyCode::PageUp => selection.saturating_sub(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => (*selection + PAGE_SCROLL_SIZE).min(last),
        KeyCode::Home => 0,
        KeyCode::End => last,
        _ => *selection,
    };
}

fn handle_books_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => app.start_book_search(SearchField::Title),
        KeyCode::Char('a') => app.start_book_search(SearchField::Author),
        KeyCode::Char('c') | KeyCode::Esc => app.clear_book_search(),
        KeyCode::Char('+') => app.navigate(Route::AddBook),
        KeyCode::Char('n') | KeyCode::Right => app.books_next_page(),
        KeyCode::Char('p') | KeyCode::Left => app.books_prev_page(),
        code => {
            let len = app.books.visible().len();
            move_selection(&mut app.books.selection, len, code);
        }
    }
}

fn handle_users_input(app: &mut App, key: KeyEvent) {
    let len = app.users.users.len();
    move_selection(&mut app.users.selection, len, key.code);
}

fn handle_transaction_input(app: &mut App, key: KeyEvent) {
    let panel = match key.code {
        KeyCode::Char('b') => TransactionPanel::Borrow,
        KeyCode::Char('t') => TransactionPanel::Return,
        KeyCode::Enter => app.transaction.panel,
        _ => return,
    };
    app.transaction.panel = panel;
    app.transaction.active_form_mut().editing = true;
}

fn handle_reports_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') | KeyCode::Right => app.reports_next_page(),
        KeyCode::Char('p') | KeyCode::Left => app.reports_prev_page(),
        KeyCode::Char('u') | KeyCode::Char('/') | KeyCode::Enter => {
            app.reports.lookup.editing = true;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_move_selection_clamps() {
        let mut selection = 0;
        move_selection(&mut selection, 3, KeyCode::Up);
        assert_eq!(selection, 0);
        move_selection(&mut selection, 3, KeyCode::Char('j'));
        move_selection(&mut selection, 3, KeyCode::Down);
        move_selection(&mut selection, 3, KeyCode::Down);
        assert_eq!(selection, 2);
        move_selection(&mut selection, 3, KeyCode::PageUp);
        assert_eq!(selection, 0);
        move_selection(&mut selection, 0, KeyCode::End);
        assert_eq!(selection, 0);
    }

    #[tokio::test]
    async fn test_escape_on_login_confirms_quit() {
        let session = std::sync::Arc::new(libradmin_core::SessionContext::in_memory());
        let mut app =
            App::with_session(libradmin_core::Config::default(), session, None).unwrap();
        app.navigate(Route::Login);

        // The login form owns the keyboard, so Esc asks to quit
        handle_input(&mut app, KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)).unwrap();
        assert_eq!(app.state, AppState::ConfirmingQuit);

        let quit =
            handle_input(&mut app, KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE)).unwrap();
        assert!(quit);
    }
}
