//! Authenticated gateway to the library service.
//!
//! `ApiClient` owns the HTTP client configuration and exposes one method per
//! remote resource action. Every request passes through `auth_headers`, which
//! attaches the session credential when one is present. Failures are handed
//! back unchanged: no retries, no caching.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::SessionContext;
use crate::models::{
    Ack, AvailabilityReport, Book, BorrowRequest, DataEnvelope, LoginRequest, LoginResponse,
    NewBook, OverdueReport, Page, ReturnRequest, SignupRequest, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/auth/login";
const SIGNUP_PATH: &str = "/auth/signup";
const LOGOUT_PATH: &str = "/auth/logout";
const BOOKS_PATH: &str = "/books/get-all-books";
const ADD_BOOK_PATH: &str = "/books/add-book";
const SEARCH_BY_NAME_PATH: &str = "/books/search/book";
const SEARCH_BY_AUTHOR_PATH: &str = "/books/search/author";
const USERS_PATH: &str = "/users/get-all-users";
const BORROW_PATH: &str = "/loan/borrow-book";
const RETURN_PATH: &str = "/loan/return-book";
const AVAILABILITY_PATH: &str = "/reports/books/availability";
const AVAILABLE_TO_BORROW_PATH: &str = "/reports/books/available-to-borrow";
const OVERDUE_PATH: &str = "/reports/overdue-reports";

/// API client for the library service.
/// Clone is cheap - reqwest::Client and the session are both shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl ApiClient {
    /// Create a client for `base_url` using the default timeout
    pub fn new(base_url: &str, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<SessionContext>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization for the outgoing request, read fresh from the session.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.token() {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        // Some mutating endpoints answer 2xx with no body at all
        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            warn!(path, error = %e, "Unexpected response shape");
            ApiError::InvalidResponse(format!("{}: {}", path, e))
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse(response, path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse(response, path).await
    }

    // ===== Authentication =====

    /// Log in and store the returned credential in the session.
    ///
    /// A response without `access_token` is `ApiError::MissingAccessToken`
    /// and leaves the session untouched.
    pub async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let response: LoginResponse = self.post(LOGIN_PATH, request).await?;
        let token = response.into_token().ok_or_else(|| {
            warn!("Login response carried no access token");
            ApiError::MissingAccessToken
        })?;

        if let Err(e) = self.session.set_token(token.clone()) {
            warn!(error = %e, "Failed to persist session");
        }
        info!("Login successful");
        Ok(token)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<Ack, ApiError> {
        self.post(SIGNUP_PATH, request).await
    }

    /// Notify the service, then clear the local credential regardless of
    /// the outcome. Any remote failure is still returned.
    pub async fn logout(&self) -> Result<Ack, ApiError> {
        let result = self.post(LOGOUT_PATH, &serde_json::json!({})).await;

        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        if let Err(ref e) = result {
            warn!(error = %e, "Remote logout failed");
        }
        result
    }

    // ===== Books =====

    pub async fn list_books(&self, page: u32, limit: u32) -> Result<Page<Book>, ApiError> {
        self.get(
            BOOKS_PATH,
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn add_book(&self, book: &NewBook) -> Result<Ack, ApiError> {
        self.post(ADD_BOOK_PATH, book).await
    }

    pub async fn search_books_by_name(&self, name: &str) -> Result<Vec<Book>, ApiError> {
        let page: Page<Book> = self
            .get(SEARCH_BY_NAME_PATH, &[("name", name.to_string())])
            .await?;
        Ok(page.items)
    }

    pub async fn search_books_by_author(&self, name: &str) -> Result<Vec<Book>, ApiError> {
        let page: Page<Book> = self
            .get(SEARCH_BY_AUTHOR_PATH, &[("name", name.to_string())])
            .await?;
        Ok(page.items)
    }

    // ===== Users =====

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let page: Page<User> = self.get(USERS_PATH, &[]).await?;
        Ok(page.items)
    }

    // ===== Loans =====

    pub async fn borrow_book(&self, request: &BorrowRequest) -> Result<Ack, ApiError> {
        self.post(BORROW_PATH, request).await
    }

    pub async fn return_book(&self, request: &ReturnRequest) -> Result<Ack, ApiError> {
        self.post(RETURN_PATH, request).await
    }

    // ===== Reports =====

    pub async fn availability_report(&self) -> Result<AvailabilityReport, ApiError> {
        self.get(AVAILABILITY_PATH, &[]).await
    }

    pub async fn available_to_borrow(&self, page: u32, limit: u32) -> Result<Page<Book>, ApiError> {
        self.get(
            AVAILABLE_TO_BORROW_PATH,
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn overdue_report(&self, user_id: i64) -> Result<OverdueReport, ApiError> {
        let envelope: DataEnvelope<OverdueReport> = self
            .get(OVERDUE_PATH, &[("userId", user_id.to_string())])
            .await?;
        Ok(envelope.data)
    }
}
