//! Application state management for libradmin.
//!
//! This module contains the `App` struct that owns the session context, the
//! session guard and the API gateway, along with the state of every view.
//! Navigation always goes through the guard. On-mount loads and form
//! submissions run as background tasks that report back over a channel, so
//! the render loop never waits on the network.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use libradmin_core::api::{ApiClient, ApiError};
use libradmin_core::auth::{GuardDecision, Route, SessionContext, SessionGuard, TokenStorage};
use libradmin_core::models::{
    parse_id, AvailabilityReport, Book, BorrowRequest, LoginRequest, NewBook, OverdueReport, Page,
    ReturnRequest, SignupRequest, User,
};
use libradmin_core::utils::format_remaining;
use libradmin_core::Config;

use crate::form::{Field, Form};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background load channel.
/// A view issues at most a few loads per visit, plus one submission.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Rows per page on the available-to-borrow report
pub const REPORT_PAGE_SIZE: u32 = 5;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// Field positions in each form
pub const LOGIN_EMAIL: usize = 0;
pub const LOGIN_PASSWORD: usize = 1;
const SIGNUP_NAME: usize = 0;
const SIGNUP_EMAIL: usize = 1;
const SIGNUP_PASSWORD: usize = 2;
const SIGNUP_CONTACT: usize = 3;
const BOOK_TITLE: usize = 0;
const BOOK_AUTHOR: usize = 1;
const BOOK_YEAR: usize = 2;
const LOAN_USER: usize = 0;
const LOAN_BOOK: usize = 1;
const LOAN_ISSUE: usize = 2;
const LOAN_DUE: usize = 3;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Which book attribute a search matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Title,
    Author,
}

impl SearchField {
    pub fn label(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Author => "author",
        }
    }
}

/// Transaction view sub-panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPanel {
    Borrow,
    Return,
}

/// A form-backed view with an error line
#[derive(Debug, Clone)]
pub struct FormView {
    pub form: Form,
    pub error: Option<String>,
}

impl FormView {
    fn new(form: Form) -> Self {
        Self { form, error: None }
    }

    fn reset(&mut self) {
        self.form.reset();
        self.error = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub total_books: Option<i64>,
    pub total_users: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BooksView {
    pub books: Vec<Book>,
    pub page: u32,
    pub total_pages: u32,
    pub selection: usize,
    pub search_field: SearchField,
    pub search_input: String,
    pub editing_search: bool,
    /// The last search submitted, and its results once they arrive
    pub search: Option<(SearchField, String)>,
    pub search_results: Option<Vec<Book>>,
    pub error: Option<String>,
}

impl Default for BooksView {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            page: 1,
            total_pages: 1,
            selection: 0,
            search_field: SearchField::Title,
            search_input: String::new(),
            editing_search: false,
            search: None,
            search_results: None,
            error: None,
        }
    }
}

impl BooksView {
    /// Search results when a search is active, otherwise the current page
    pub fn visible(&self) -> &[Book] {
        self.search_results.as_deref().unwrap_or(&self.books)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsersView {
    pub users: Vec<User>,
    pub selection: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransactionView {
    pub borrow: Form,
    pub return_form: Form,
    pub panel: TransactionPanel,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl TransactionView {
    pub fn active_form(&self) -> &Form {
        match self.panel {
            TransactionPanel::Borrow => &self.borrow,
            TransactionPanel::Return => &self.return_form,
        }
    }

    pub fn active_form_mut(&mut self) -> &mut Form {
        match self.panel {
            TransactionPanel::Borrow => &mut self.borrow,
            TransactionPanel::Return => &mut self.return_form,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportsView {
    pub availability: Option<AvailabilityReport>,
    pub available: Vec<Book>,
    pub page: u32,
    pub total_pages: u32,
    pub lookup: Form,
    pub requested_user: Option<i64>,
    pub overdue: Option<OverdueReport>,
    pub error: Option<String>,
}

// ============================================================================
// Background Load Results
// ============================================================================

/// The request a background result answers.
///
/// Each kind holds at most one wanted request; issuing a new one of the same
/// kind makes the earlier reply stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LoadKey {
    Dashboard,
    BooksPage(u32),
    Search(SearchField, String),
    Users,
    Availability,
    AvailableToBorrow(u32),
    Overdue(i64),
    Submit,
}

impl LoadKey {
    fn same_kind(&self, other: &LoadKey) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Data fetched for a view by a background task
#[derive(Debug)]
enum ViewData {
    Dashboard { total_books: i64, total_users: usize },
    BooksPage(Page<Book>),
    SearchResults(Vec<Book>),
    Users(Vec<User>),
    Availability(AvailabilityReport),
    AvailableToBorrow(Page<Book>),
    Overdue(OverdueReport),
    Submitted(Submitted),
    /// A load failed; the message is shown on the view
    Failed(String),
}

/// Outcome of a form submission. Errors are already user-facing text.
#[derive(Debug)]
enum Submitted {
    Login { email: String, result: Result<(), String> },
    Signup { email: String, result: Result<(), String> },
    BookAdded { title: String, result: Result<(), String> },
    Borrowed(Result<String, String>),
    Returned(Result<String, String>),
    LoggedOut,
}

/// A result tagged with the navigation and request it belongs to
#[derive(Debug)]
struct ViewMessage {
    visit: u64,
    key: LoadKey,
    data: ViewData,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    config_path: Option<PathBuf>,
    pub session: Arc<SessionContext>,
    pub guard: SessionGuard,
    pub api: ApiClient,

    // Navigation
    pub state: AppState,
    pub route: Route,
    /// Incremented on every navigation; results from older visits are dropped
    visit: u64,
    /// Requests of the current visit whose replies are still wanted
    pending: HashSet<LoadKey>,

    // Views
    pub login: FormView,
    pub signup: FormView,
    pub dashboard: DashboardView,
    pub books: BooksView,
    pub add_book: FormView,
    pub users: UsersView,
    pub transaction: TransactionView,
    pub reports: ReportsView,

    pub status_message: Option<String>,

    // Background load channel
    load_tx: mpsc::Sender<ViewMessage>,
    load_rx: mpsc::Receiver<ViewMessage>,
}

/// Open the configured session backend and load any persisted entry.
///
/// A backend that cannot be read leaves the session empty.
pub fn open_session(config: &Config) -> Arc<SessionContext> {
    let cache_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    open_session_in(config.token_storage, cache_dir)
}

fn open_session_in(storage: TokenStorage, session_dir: PathBuf) -> Arc<SessionContext> {
    debug!(?session_dir, ?storage, "Session storage configured");

    let session = SessionContext::open(storage, session_dir);
    match session.load() {
        Ok(found) => debug!(found, "Session loaded"),
        Err(e) => warn!(error = %e, "Failed to load session, starting logged out"),
    }
    Arc::new(session)
}

impl App {
    /// Create the application from the user's config and persisted session
    pub fn new(config: Config) -> Result<Self> {
        let session = open_session(&config);
        let config_path = Config::path().ok();
        Self::with_session(config, session, config_path)
    }

    /// Create the application around an existing session context.
    ///
    /// When `config_path` is `None` config changes are kept in memory only.
    pub fn with_session(
        config: Config,
        session: Arc<SessionContext>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let api = ApiClient::with_timeout(
            &config.api_base_url,
            session.clone(),
            config.request_timeout(),
        )?;
        let guard = SessionGuard::new(session.clone());
        let (load_tx, load_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            config_path,
            session,
            guard,
            api,
            state: AppState::Normal,
            route: Route::LOGIN_ENTRY,
            visit: 0,
            pending: HashSet::new(),
            login: FormView::new(login_form()),
            signup: FormView::new(signup_form()),
            dashboard: DashboardView::default(),
            books: BooksView::default(),
            add_book: FormView::new(add_book_form()),
            users: UsersView::default(),
            transaction: TransactionView {
                borrow: borrow_form(),
                return_form: return_form(),
                panel: TransactionPanel::Borrow,
                error: None,
                success: None,
            },
            reports: ReportsView {
                availability: None,
                available: Vec::new(),
                page: 1,
                total_pages: 1,
                lookup: lookup_form(),
                requested_user: None,
                overdue: None,
                error: None,
            },
            status_message: None,
            load_tx,
            load_rx,
        })
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to `requested`, subject to the session guard.
    pub fn navigate(&mut self, requested: Route) {
        let decision = self.guard.check(requested);
        if let GuardDecision::Redirect { ref reason, .. } = decision {
            debug!(requested = %requested, ?reason, "Navigation redirected to login");
        }

        let route = decision.route();
        self.visit += 1;
        self.pending.clear();
        self.route = route;
        self.status_message = None;
        debug!(route = %route, visit = self.visit, "Mounting view");
        self.mount(route);
    }

    /// Re-run the guard and on-mount loads for the current view
    pub fn reload(&mut self) {
        self.navigate(self.route);
    }

    /// Move to the next or previous entry of the side navigation
    pub fn navigate_relative(&mut self, forward: bool) {
        let nav: Vec<Route> = Route::navigation().collect();
        let current = nav.iter().position(|r| *r == self.route).unwrap_or(0);
        let next = if forward {
            (current + 1) % nav.len()
        } else {
            (current + nav.len() - 1) % nav.len()
        };
        self.navigate(nav[next]);
    }

    fn mount(&mut self, route: Route) {
        match route {
            Route::Login => {
                // Arriving at the login view ends any previous session
                if let Err(e) = self.session.clear() {
                    warn!(error = %e, "Failed to clear session");
                }
                self.login.reset();
                if let Some(email) = self.config.last_email.clone() {
                    self.login.form.set_value(LOGIN_EMAIL, email);
                    self.login.form.focus = LOGIN_PASSWORD;
                }
            }
            Route::Signup => self.signup.reset(),
            Route::Dashboard => {
                self.dashboard = DashboardView::default();
                // The availability report counts the whole catalogue, not one page
                self.spawn_load(LoadKey::Dashboard, |api| async move {
                    let (report, users) =
                        futures::future::try_join(api.availability_report(), api.list_users())
                            .await?;
                    Ok(ViewData::Dashboard {
                        total_books: report.total_books,
                        total_users: users.len(),
                    })
                });
            }
            Route::Books => {
                self.books = BooksView::default();
                self.load_books_page();
            }
            Route::AddBook => self.add_book.reset(),
            Route::Users => {
                self.users = UsersView::default();
                self.spawn_load(LoadKey::Users, |api| async move {
                    api.list_users().await.map(ViewData::Users)
                });
            }
            Route::Transaction => {
                let transaction = &mut self.transaction;
                transaction.borrow.reset();
                transaction.return_form.reset();
                // Navigation keys stay live until a form is opened
                transaction.borrow.editing = false;
                transaction.return_form.editing = false;
                transaction.panel = TransactionPanel::Borrow;
                transaction.error = None;
                transaction.success = None;
            }
            Route::Reports => {
                self.reports.availability = None;
                self.reports.available.clear();
                self.reports.page = 1;
                self.reports.total_pages = 1;
                self.reports.lookup.reset();
                self.reports.lookup.editing = false;
                self.reports.requested_user = None;
                self.reports.overdue = None;
                self.reports.error = None;
                self.spawn_load(LoadKey::Availability, |api| async move {
                    api.availability_report().await.map(ViewData::Availability)
                });
                self.load_available_page();
            }
        }
    }

    /// Whether keys should go to a text input rather than navigation
    pub fn is_editing(&self) -> bool {
        match self.route {
            Route::Login | Route::Signup => true,
            Route::AddBook => self.add_book.form.editing,
            Route::Books => self.books.editing_search,
            Route::Transaction => self.transaction.active_form().editing,
            Route::Reports => self.reports.lookup.editing,
            Route::Dashboard | Route::Users => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether a form submission or logout is waiting on the service
    pub fn is_submitting(&self) -> bool {
        self.pending.contains(&LoadKey::Submit)
    }

    /// Identity and time left on the current credential, for the title bar
    pub fn session_summary(&self) -> Option<String> {
        let claims = self.session.claims()?.ok()?;
        let who = claims.display_name().unwrap_or("signed in").to_string();
        let remaining = claims
            .expires_at()
            .map(|at| format_remaining(at, Utc::now()))
            .unwrap_or_default();
        Some(format!("{} ({})", who, remaining))
    }

    // =========================================================================
    // Background Loads
    // =========================================================================

    fn spawn_load<F, Fut>(&mut self, key: LoadKey, load: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<ViewData, ApiError>> + Send + 'static,
    {
        let api = self.api.clone();
        let tx = self.load_tx.clone();
        let visit = self.visit;
        let route = self.route;
        self.pending.retain(|pending| !pending.same_kind(&key));
        self.pending.insert(key.clone());

        tokio::spawn(async move {
            let data = match load(api).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(route = %route, error = %e, "View load failed");
                    ViewData::Failed(e.user_message())
                }
            };
            Self::send_result(&tx, ViewMessage { visit, key, data }).await;
        });
    }

    /// Run a submission in the background. Its outcome carries any error.
    fn spawn_submit<F, Fut>(&mut self, submit: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Submitted> + Send + 'static,
    {
        self.spawn_load(LoadKey::Submit, |api| async move {
            Ok(ViewData::Submitted(submit(api).await))
        });
    }

    async fn send_result(tx: &mpsc::Sender<ViewMessage>, message: ViewMessage) {
        if tx.send(message).await.is_err() {
            debug!("Load channel closed, dropping result");
        }
    }

    /// Apply any finished background loads
    pub fn check_background_tasks(&mut self) {
        let mut messages = Vec::new();
        while let Ok(message) = self.load_rx.try_recv() {
            messages.push(message);
        }
        for message in messages {
            self.apply(message);
        }
    }

    fn apply(&mut self, message: ViewMessage) {
        if message.visit != self.visit {
            debug!(
                visit = message.visit,
                current = self.visit,
                "Dropping result for a view no longer shown"
            );
            return;
        }
        if !self.pending.remove(&message.key) {
            debug!(key = ?message.key, "Dropping reply to a superseded request");
            return;
        }

        match message.data {
            ViewData::Dashboard {
                total_books,
                total_users,
            } => {
                self.dashboard.total_books = Some(total_books);
                self.dashboard.total_users = Some(total_users);
            }
            ViewData::BooksPage(books) => {
                self.books.total_pages = books.total_pages();
                self.books.books = books.items;
                self.books.selection = 0;
            }
            ViewData::SearchResults(books) => {
                self.books.search_results = Some(books);
                self.books.selection = 0;
            }
            ViewData::Users(users) => {
                self.users.users = users;
                self.users.selection = 0;
            }
            ViewData::Availability(report) => self.reports.availability = Some(report),
            ViewData::AvailableToBorrow(books) => {
                self.reports.total_pages = books.total_pages();
                self.reports.available = books.items;
            }
            ViewData::Overdue(report) => self.reports.overdue = Some(report),
            ViewData::Submitted(outcome) => self.finish_submit(outcome),
            ViewData::Failed(message) => self.set_view_error(message),
        }
    }

    fn set_view_error(&mut self, message: String) {
        let slot = match self.route {
            Route::Dashboard => &mut self.dashboard.error,
            Route::Books => &mut self.books.error,
            Route::Users => &mut self.users.error,
            Route::Reports => &mut self.reports.error,
            Route::Transaction => &mut self.transaction.error,
            Route::AddBook => &mut self.add_book.error,
            Route::Login => &mut self.login.error,
            Route::Signup => &mut self.signup.error,
        };
        *slot = Some(message);
    }

    // =========================================================================
    // Books
    // =========================================================================

    fn load_books_page(&mut self) {
        let page = self.books.page;
        let limit = self.config.page_size;
        self.books.error = None;
        self.spawn_load(LoadKey::BooksPage(page), move |api| async move {
            api.list_books(page, limit).await.map(ViewData::BooksPage)
        });
    }

    pub fn books_next_page(&mut self) {
        if self.books.search_results.is_none() && self.books.page < self.books.total_pages {
            self.books.page += 1;
            self.load_books_page();
        }
    }

    pub fn books_prev_page(&mut self) {
        if self.books.search_results.is_none() && self.books.page > 1 {
            self.books.page -= 1;
            self.load_books_page();
        }
    }

    pub fn start_book_search(&mut self, field: SearchField) {
        self.books.search_field = field;
        self.books.search_input.clear();
        self.books.editing_search = true;
    }

    /// Run the typed search, or clear the search when the input is empty
    pub fn submit_book_search(&mut self) {
        self.books.editing_search = false;
        let query = self.books.search_input.trim().to_string();
        if query.is_empty() {
            self.clear_book_search();
            return;
        }

        let field = self.books.search_field;
        self.books.search = Some((field, query.clone()));
        self.books.search_results = None;
        self.books.error = None;
        let key = LoadKey::Search(field, query.clone());
        self.spawn_load(key, move |api| async move {
            let books = match field {
                SearchField::Title => api.search_books_by_name(&query).await?,
                SearchField::Author => api.search_books_by_author(&query).await?,
            };
            Ok(ViewData::SearchResults(books))
        });
    }

    pub fn clear_book_search(&mut self) {
        self.books.editing_search = false;
        self.books.search_input.clear();
        self.books.search = None;
        self.books.search_results = None;
        self.books.selection = 0;
        self.pending.retain(|key| !matches!(key, LoadKey::Search(..)));
    }

    // =========================================================================
    // Reports
    // =========================================================================

    fn load_available_page(&mut self) {
        let page = self.reports.page;
        self.spawn_load(LoadKey::AvailableToBorrow(page), move |api| async move {
            api.available_to_borrow(page, REPORT_PAGE_SIZE)
                .await
                .map(ViewData::AvailableToBorrow)
        });
    }

    pub fn reports_next_page(&mut self) {
        if self.reports.page < self.reports.total_pages {
            self.reports.page += 1;
            self.load_available_page();
        }
    }

    pub fn reports_prev_page(&mut self) {
        if self.reports.page > 1 {
            self.reports.page -= 1;
            self.load_available_page();
        }
    }

    /// Look up overdue loans for the user id typed in the lookup form
    pub fn lookup_overdue(&mut self) {
        let user_id = match parse_id("User ID", self.reports.lookup.value(0)) {
            Ok(id) => id,
            Err(_) => {
                self.reports.error = Some("Please enter a valid User ID".to_string());
                return;
            }
        };

        self.reports.lookup.editing = false;
        self.reports.error = None;
        self.reports.requested_user = Some(user_id);
        self.reports.overdue = None;
        self.spawn_load(LoadKey::Overdue(user_id), move |api| async move {
            api.overdue_report(user_id).await.map(ViewData::Overdue)
        });
    }

    // =========================================================================
    // Form Submissions
    // =========================================================================

    /// Attempt login with the credentials from the login form
    pub fn submit_login(&mut self) {
        let email = self.login.form.value(LOGIN_EMAIL).trim().to_string();
        let password = self.login.form.value(LOGIN_PASSWORD).to_string();

        if email.is_empty() || password.is_empty() {
            self.login.error = Some("Email and password required".to_string());
            return;
        }
        self.login.error = None;

        let request = LoginRequest {
            email: email.clone(),
            password,
        };
        self.spawn_submit(move |api| async move {
            let result = api.login(&request).await.map(|_| ()).map_err(|e| {
                error!(error = %e, "Login failed");
                e.user_message()
            });
            Submitted::Login { email, result }
        });
    }

    pub fn submit_signup(&mut self) {
        let form = &self.signup.form;
        let request = SignupRequest {
            name: form.value(SIGNUP_NAME).trim().to_string(),
            email: form.value(SIGNUP_EMAIL).trim().to_string(),
            password: form.value(SIGNUP_PASSWORD).to_string(),
            contact_info: form.value(SIGNUP_CONTACT).trim().to_string(),
        };
        if let Err(message) = request.validate() {
            self.signup.error = Some(message);
            return;
        }
        self.signup.error = None;

        self.spawn_submit(move |api| async move {
            let result = api.signup(&request).await.map(|_| ()).map_err(|e| {
                warn!(error = %e, "Signup failed");
                e.user_message()
            });
            Submitted::Signup {
                email: request.email,
                result,
            }
        });
    }

    pub fn submit_add_book(&mut self) {
        let form = &self.add_book.form;
        let book = NewBook {
            title: form.value(BOOK_TITLE).trim().to_string(),
            author: form.value(BOOK_AUTHOR).trim().to_string(),
            publication_year: form.value(BOOK_YEAR).trim().to_string(),
        };
        if let Err(message) = book.validate() {
            self.add_book.error = Some(message);
            return;
        }
        self.add_book.error = None;

        self.spawn_submit(move |api| async move {
            let result = api.add_book(&book).await.map(|_| ()).map_err(|e| {
                warn!(error = %e, "Adding book failed");
                e.user_message()
            });
            Submitted::BookAdded {
                title: book.title,
                result,
            }
        });
    }

    pub fn submit_borrow(&mut self) {
        let form = &self.transaction.borrow;
        let request = match BorrowRequest::from_form(
            form.value(LOAN_USER),
            form.value(LOAN_BOOK),
            form.value(LOAN_ISSUE),
            form.value(LOAN_DUE),
            Local::now().date_naive(),
        ) {
            Ok(request) => request,
            Err(message) => {
                self.transaction.error = Some(message);
                return;
            }
        };
        self.transaction.error = None;

        self.spawn_submit(move |api| async move {
            let result = match api.borrow_book(&request).await {
                Ok(ack) => {
                    info!(user_id = request.user_id, book_id = request.book_id, "Book borrowed");
                    Ok(ack.message.unwrap_or_else(|| {
                        format!(
                            "Book {} lent to user {} until {}",
                            request.book_id, request.user_id, request.due_date
                        )
                    }))
                }
                Err(e) => {
                    warn!(error = %e, "Borrow failed");
                    Err(e.user_message())
                }
            };
            Submitted::Borrowed(result)
        });
    }

    pub fn submit_return(&mut self) {
        let form = &self.transaction.return_form;
        let request = match ReturnRequest::from_form(form.value(LOAN_USER), form.value(LOAN_BOOK)) {
            Ok(request) => request,
            Err(message) => {
                self.transaction.error = Some(message);
                return;
            }
        };
        self.transaction.error = None;

        self.spawn_submit(move |api| async move {
            let result = match api.return_book(&request).await {
                Ok(ack) => {
                    info!(user_id = request.user_id, book_id = request.book_id, "Book returned");
                    Ok(ack.message.unwrap_or_else(|| {
                        format!("Book {} returned by user {}", request.book_id, request.user_id)
                    }))
                }
                Err(e) => {
                    warn!(error = %e, "Return failed");
                    Err(e.user_message())
                }
            };
            Submitted::Returned(result)
        });
    }

    /// Log out. A failed remote notification is logged and otherwise ignored;
    /// the local session is always gone afterwards.
    pub fn logout(&mut self) {
        self.spawn_submit(|api| async move {
            if let Err(e) = api.logout().await {
                warn!(error = %e, "Remote logout failed, session cleared locally");
            }
            Submitted::LoggedOut
        });
    }

    fn finish_submit(&mut self, outcome: Submitted) {
        match outcome {
            Submitted::Login {
                email,
                result: Ok(()),
            } => {
                self.config.last_email = Some(email);
                self.save_config();
                self.login.form.set_value(LOGIN_PASSWORD, "");
                self.navigate(Route::HOME);
            }
            Submitted::Login {
                result: Err(message),
                ..
            } => self.login.error = Some(message),
            Submitted::Signup {
                email,
                result: Ok(()),
            } => {
                info!("Account created");
                self.navigate(Route::Login);
                self.login.form.set_value(LOGIN_EMAIL, email);
                self.login.form.focus = LOGIN_PASSWORD;
                self.status_message = Some("Account created. Please log in.".to_string());
            }
            Submitted::Signup {
                result: Err(message),
                ..
            } => self.signup.error = Some(format!("Signup failed: {}", message)),
            Submitted::BookAdded {
                title,
                result: Ok(()),
            } => {
                info!(title = %title, "Book added");
                self.navigate(Route::Books);
                self.status_message = Some(format!("Added \"{}\"", title));
            }
            Submitted::BookAdded {
                result: Err(message),
                ..
            } => self.add_book.error = Some(format!("Error adding new book: {}", message)),
            Submitted::Borrowed(Ok(message)) => {
                self.navigate(Route::Transaction);
                self.transaction.success = Some(message);
            }
            Submitted::Borrowed(Err(message)) => {
                self.transaction.error = Some(format!("Error while borrowing book: {}", message));
            }
            Submitted::Returned(Ok(message)) => {
                self.navigate(Route::Transaction);
                self.transaction.panel = TransactionPanel::Return;
                self.transaction.success = Some(message);
            }
            Submitted::Returned(Err(message)) => {
                self.transaction.error = Some(format!("Error while returning book: {}", message));
            }
            Submitted::LoggedOut => {
                info!("Logged out");
                self.navigate(Route::Login);
                self.status_message = Some("Logged out".to_string());
            }
        }
    }

    fn save_config(&self) {
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }
}

// ============================================================================
// Form Layouts
// ============================================================================

fn login_form() -> Form {
    Form::new(
        vec![Field::text("Email"), Field::masked("Password")],
        vec!["Log in", "Create an account"],
    )
}

fn signup_form() -> Form {
    Form::new(
        vec![
            Field::text("Name"),
            Field::text("Email"),
            Field::masked("Password"),
            Field::text("Contact info").with_hint("phone or address"),
        ],
        vec!["Sign up", "Back to login"],
    )
}

fn add_book_form() -> Form {
    Form::new(
        vec![
            Field::text("Title"),
            Field::text("Author"),
            Field::text("Publication year").with_max_len(4),
        ],
        vec!["Add book", "Cancel"],
    )
}

fn borrow_form() -> Form {
    Form::new(
        vec![
            Field::text("User ID"),
            Field::text("Book ID"),
            Field::text("Issue date").with_hint("YYYY-MM-DD, blank for today"),
            Field::text("Due date").with_hint("YYYY-MM-DD, blank for two weeks"),
        ],
        vec!["Borrow"],
    )
}

fn return_form() -> Form {
    Form::new(vec![Field::text("User ID"), Field::text("Book ID")], vec!["Return"])
}

fn lookup_form() -> Form {
    Form::new(vec![Field::text("User ID").with_max_len(12)], vec!["Look up"])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::routing::{get, post};
    use axum::{Json, Router};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use libradmin_core::auth::token::unsigned_token;
    use serde_json::json;

    use crate::ui::input::handle_input;

    /// An address nothing is listening on
    async fn closed_base_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    /// Serve `router` on a local port and return its base URL
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn app_for(api_base_url: String, token: Option<String>) -> App {
        let session = Arc::new(SessionContext::in_memory());
        if let Some(token) = token {
            session.set_token(token).unwrap();
        }
        let config = Config {
            api_base_url,
            ..Config::default()
        };
        App::with_session(config, session, None).unwrap()
    }

    async fn test_app(token: Option<String>) -> App {
        app_for(closed_base_url().await, token)
    }

    /// Apply background results until `done` holds or about two seconds pass
    async fn wait_until(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..100 {
            app.check_background_tasks();
            if done(app) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    fn token_valid_for(seconds: i64) -> String {
        unsigned_token(&json!({
            "exp": Utc::now().timestamp() + seconds,
            "email": "ada@example.org"
        }))
    }

    fn sample_user(id: i64) -> User {
        User {
            user_id: id,
            name: format!("User {}", id),
            email: format!("u{}@example.org", id),
            role: None,
            contact_info: None,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_open_session_loads_persisted_entry() {
        let dir = tempfile::tempdir().unwrap();
        SessionContext::open(TokenStorage::File, dir.path().to_path_buf())
            .set_token("persisted".to_string())
            .unwrap();

        let session = open_session_in(TokenStorage::File, dir.path().to_path_buf());
        assert_eq!(session.token().as_deref(), Some("persisted"));

        // An unreadable entry starts logged out
        std::fs::write(dir.path().join("session.json"), "{not json").unwrap();
        let session = open_session_in(TokenStorage::File, dir.path().to_path_buf());
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn test_protected_views_redirect_without_session() {
        let mut app = test_app(None).await;
        for route in Route::navigation() {
            app.navigate(route);
            assert_eq!(app.route, Route::Login);
            assert!(!app.is_loading(), "{} started loading", route);
        }
    }

    #[tokio::test]
    async fn test_expired_session_redirects_and_clears() {
        let mut app = test_app(Some(token_valid_for(-1))).await;
        app.navigate(Route::Books);
        assert_eq!(app.route, Route::Login);
        assert_eq!(app.session.token(), None);
    }

    #[tokio::test]
    async fn test_valid_session_mounts_view() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Users);
        assert_eq!(app.route, Route::Users);
        assert!(app.is_loading());
        assert!(app.session_summary().unwrap().starts_with("ada@example.org"));
    }

    #[tokio::test]
    async fn test_results_for_old_visits_are_dropped() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Users);
        let users_visit = app.visit;
        app.navigate(Route::Dashboard);

        app.apply(ViewMessage {
            visit: users_visit,
            key: LoadKey::Users,
            data: ViewData::Users(vec![sample_user(1)]),
        });
        assert!(app.users.users.is_empty());
        assert!(app.is_loading());

        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::Dashboard,
            data: ViewData::Dashboard {
                total_books: 12,
                total_users: 3,
            },
        });
        assert_eq!(app.dashboard.total_books, Some(12));
        assert_eq!(app.dashboard.total_users, Some(3));
        assert!(!app.is_loading());
    }

    #[tokio::test]
    async fn test_dashboard_counts_whole_catalogue() {
        let book = json!({"book_id": 1, "title": "Dune"});
        let first_page = json!({
            "data": vec![book; 10],
            "pagination": {"totalPages": 25}
        });
        let router = Router::new()
            .route(
                "/books/get-all-books",
                get(move || {
                    let first_page = first_page.clone();
                    async move { Json(first_page) }
                }),
            )
            .route(
                "/reports/books/availability",
                get(|| async {
                    Json(json!({
                        "total_books": 250,
                        "total_borrowed_books": 40,
                        "total_available_books": 210
                    }))
                }),
            )
            .route("/users/get-all-users", get(|| async { Json(json!([])) }));
        let mut app = app_for(serve(router).await, Some(token_valid_for(3600)));

        app.navigate(Route::Dashboard);
        wait_until(&mut app, |app| !app.is_loading()).await;

        assert_eq!(app.dashboard.error, None);
        assert_eq!(app.dashboard.total_books, Some(250));
        assert_eq!(app.dashboard.total_users, Some(0));
    }

    #[tokio::test]
    async fn test_stale_page_reply_keeps_view_loading() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Reports);
        app.reports.total_pages = 3;
        app.reports_next_page();
        assert_eq!(app.reports.page, 2);

        let empty = || Page::<Book> {
            items: vec![],
            pagination: None,
        };
        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::Availability,
            data: ViewData::Availability(AvailabilityReport::default()),
        });
        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::AvailableToBorrow(1),
            data: ViewData::AvailableToBorrow(empty()),
        });
        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::AvailableToBorrow(1),
            data: ViewData::Failed("late failure".to_string()),
        });

        // Still waiting for page 2; the late page 1 replies change nothing
        assert!(app.is_loading());
        assert_eq!(app.reports.total_pages, 3);
        assert_eq!(app.reports.error, None);

        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::AvailableToBorrow(2),
            data: ViewData::AvailableToBorrow(empty()),
        });
        assert!(!app.is_loading());
        assert_eq!(app.reports.total_pages, 1);
    }

    #[tokio::test]
    async fn test_load_failure_lands_on_current_view() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Users);

        // The gateway points at a closed port, so the load fails
        wait_until(&mut app, |app| app.users.error.is_some()).await;
        assert!(app.users.error.is_some());
        assert!(!app.is_loading());
        assert_eq!(app.route, Route::Users);
    }

    #[tokio::test]
    async fn test_login_failure_shows_error_and_stores_nothing() {
        let mut app = test_app(None).await;
        app.navigate(Route::Login);
        app.login.form.set_value(LOGIN_EMAIL, "ada@example.org");
        app.login.form.set_value(LOGIN_PASSWORD, "secret");

        app.submit_login();
        assert!(app.is_submitting());
        wait_until(&mut app, |app| !app.is_submitting()).await;

        assert_eq!(app.route, Route::Login);
        assert!(app.login.error.is_some());
        assert_eq!(app.session.token(), None);
    }

    #[tokio::test]
    async fn test_login_success_lands_on_dashboard() {
        let token = token_valid_for(3600);
        let reply = json!({ "access_token": token.clone() });
        let router = Router::new().route(
            "/auth/login",
            post(move || {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        );
        let mut app = app_for(serve(router).await, None);
        app.navigate(Route::HOME);
        assert_eq!(app.route, Route::Login);

        app.login.form.set_value(LOGIN_EMAIL, "ada@example.org");
        app.login.form.set_value(LOGIN_PASSWORD, "secret");
        app.submit_login();
        wait_until(&mut app, |app| app.route == Route::Dashboard).await;

        assert_eq!(app.login.error, None);
        assert_eq!(app.session.token(), Some(token));
        assert_eq!(app.route, Route::Dashboard);
        assert_eq!(app.config.last_email.as_deref(), Some("ada@example.org"));
        assert_eq!(app.login.form.value(LOGIN_PASSWORD), "");
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let mut app = test_app(None).await;
        app.navigate(Route::Login);
        app.submit_login();
        assert_eq!(app.login.error.as_deref(), Some("Email and password required"));
        assert!(!app.is_submitting());
    }

    #[tokio::test]
    async fn test_loads_apply_while_submission_is_in_flight() {
        let release = Arc::new(tokio::sync::Notify::new());
        let gate = release.clone();
        let router = Router::new()
            .route(
                "/reports/books/availability",
                get(|| async { Json(json!({"total_books": 7})) }),
            )
            .route("/users/get-all-users", get(|| async { Json(json!([])) }))
            .route(
                "/auth/logout",
                post(move || {
                    let gate = gate.clone();
                    async move {
                        gate.notified().await;
                        Json(json!({"message": "bye"}))
                    }
                }),
            );
        let mut app = app_for(serve(router).await, Some(token_valid_for(3600)));

        app.navigate(Route::Dashboard);
        app.logout();
        assert!(app.is_submitting());

        // Keys are dropped without waiting while the logout is held
        assert!(!handle_input(&mut app, key(KeyCode::Char('3'))).unwrap());
        assert_eq!(app.route, Route::Dashboard);

        wait_until(&mut app, |app| app.dashboard.total_users.is_some()).await;
        assert_eq!(app.dashboard.total_books, Some(7));
        assert!(app.is_submitting());
        assert_eq!(app.route, Route::Dashboard);

        release.notify_one();
        wait_until(&mut app, |app| app.route == Route::Login).await;
        assert_eq!(app.route, Route::Login);
        assert_eq!(app.session.token(), None);
        assert_eq!(app.status_message.as_deref(), Some("Logged out"));
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_when_unreachable() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Dashboard);
        assert_eq!(app.route, Route::Dashboard);

        app.logout();
        wait_until(&mut app, |app| app.route == Route::Login).await;
        assert_eq!(app.route, Route::Login);
        assert_eq!(app.session.token(), None);
        assert_eq!(app.status_message.as_deref(), Some("Logged out"));

        app.navigate(Route::Dashboard);
        assert_eq!(app.route, Route::Login);
    }

    #[tokio::test]
    async fn test_login_view_clears_session_and_prefills_email() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.config.last_email = Some("ada@example.org".to_string());
        app.navigate(Route::Login);
        assert_eq!(app.session.token(), None);
        assert_eq!(app.login.form.value(LOGIN_EMAIL), "ada@example.org");
        assert_eq!(app.login.form.focus, LOGIN_PASSWORD);
    }

    #[tokio::test]
    async fn test_invalid_forms_do_not_submit() {
        let mut app = test_app(Some(token_valid_for(3600))).await;

        app.navigate(Route::AddBook);
        app.add_book.form.set_value(BOOK_TITLE, "Dune");
        app.submit_add_book();
        assert_eq!(app.add_book.error.as_deref(), Some("Author is required"));
        assert!(!app.is_submitting());

        app.navigate(Route::Transaction);
        app.transaction.borrow.set_value(LOAN_USER, "abc");
        app.submit_borrow();
        assert_eq!(
            app.transaction.error.as_deref(),
            Some("User ID must be a positive number")
        );
        assert!(!app.is_submitting());

        app.navigate(Route::Reports);
        app.reports.lookup.set_value(0, "  ");
        app.lookup_overdue();
        assert_eq!(app.reports.error.as_deref(), Some("Please enter a valid User ID"));
        assert_eq!(app.reports.requested_user, None);
    }

    #[tokio::test]
    async fn test_transaction_view_opens_without_capturing_keys() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Transaction);
        assert!(!app.is_editing());

        // Number keys still switch views
        handle_input(&mut app, key(KeyCode::Char('1'))).unwrap();
        assert_eq!(app.route, Route::Dashboard);

        app.navigate(Route::Transaction);
        handle_input(&mut app, key(KeyCode::Char('t'))).unwrap();
        assert_eq!(app.transaction.panel, TransactionPanel::Return);
        assert!(app.is_editing());
    }

    #[tokio::test]
    async fn test_book_search_results_replace_list() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Books);
        app.start_book_search(SearchField::Author);
        app.books.search_input = "Herbert".to_string();
        app.submit_book_search();
        assert_eq!(app.books.search, Some((SearchField::Author, "Herbert".to_string())));

        let dune = Book {
            book_id: 1,
            title: "Dune".to_string(),
            author: Some("Frank Herbert".to_string()),
            publication_year: None,
            description: None,
            image_url: None,
            available_copies: None,
        };
        // A reply for a different query is ignored
        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::Search(SearchField::Title, "Herbert".to_string()),
            data: ViewData::SearchResults(vec![dune.clone()]),
        });
        assert!(app.books.search_results.is_none());

        app.apply(ViewMessage {
            visit: app.visit,
            key: LoadKey::Search(SearchField::Author, "Herbert".to_string()),
            data: ViewData::SearchResults(vec![dune]),
        });
        assert_eq!(app.books.visible().len(), 1);

        app.clear_book_search();
        assert!(app.books.visible().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_relative_wraps() {
        let mut app = test_app(Some(token_valid_for(3600))).await;
        app.navigate(Route::Dashboard);
        app.navigate_relative(false);
        assert_eq!(app.route, Route::Reports);
        app.navigate_relative(true);
        assert_eq!(app.route, Route::Dashboard);
    }
}
