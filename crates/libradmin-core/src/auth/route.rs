/// Navigable views of the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Books,
    AddBook,
    Users,
    Transaction,
    Reports,
}

impl Route {
    /// Every route, in side-navigation order for the protected ones
    pub const ALL: [Route; 8] = [
        Route::Login,
        Route::Signup,
        Route::Dashboard,
        Route::Books,
        Route::AddBook,
        Route::Users,
        Route::Transaction,
        Route::Reports,
    ];

    /// Where the guard sends callers without a valid session
    pub const LOGIN_ENTRY: Route = Route::Login;

    /// Where a successful login lands
    pub const HOME: Route = Route::Dashboard;

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/auth/login",
            Route::Signup => "/auth/signup",
            Route::Dashboard => "/",
            Route::Books => "/books",
            Route::AddBook => "/add-book",
            Route::Users => "/users/get-all-users",
            Route::Transaction => "/transaction",
            Route::Reports => "/reports",
        }
    }

    /// Resolve a path, ignoring any query string and a trailing slash.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    /// Protected routes are only reachable with a valid credential.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Signup => "Sign Up",
            Route::Dashboard => "Dashboard",
            Route::Books => "Books",
            Route::AddBook => "Add Book",
            Route::Users => "Users",
            Route::Transaction => "Transactions",
            Route::Reports => "Reports",
        }
    }

    /// Protected routes in side-navigation order
    pub fn navigation() -> impl Iterator<Item = Route> {
        Self::ALL.into_iter().filter(Route::is_protected)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
