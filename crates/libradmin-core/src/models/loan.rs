use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default loan length when the form leaves the due date blank
pub const DEFAULT_LOAN_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub user_id: i64,
    pub book_id: i64,
    /// Serialized as `YYYY-MM-DD`
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl BorrowRequest {
    /// Build a request from raw form text.
    ///
    /// A blank issue date means today; a blank due date means
    /// `DEFAULT_LOAN_DAYS` after the issue date.
    pub fn from_form(
        user_id: &str,
        book_id: &str,
        issue_date: &str,
        due_date: &str,
        today: NaiveDate,
    ) -> Result<Self, String> {
        let user_id = parse_id("User ID", user_id)?;
        let book_id = parse_id("Book ID", book_id)?;
        let issue_date = match issue_date.trim() {
            "" => today,
            s => parse_date("Issue date", s)?,
        };
        let due_date = match due_date.trim() {
            "" => issue_date + chrono::Duration::days(DEFAULT_LOAN_DAYS),
            s => parse_date("Due date", s)?,
        };
        if due_date < issue_date {
            return Err("Due date cannot be before the issue date".to_string());
        }
        Ok(Self {
            user_id,
            book_id,
            issue_date,
            due_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub user_id: i64,
    pub book_id: i64,
}

impl ReturnRequest {
    pub fn from_form(user_id: &str, book_id: &str) -> Result<Self, String> {
        Ok(Self {
            user_id: parse_id("User ID", user_id)?,
            book_id: parse_id("Book ID", book_id)?,
        })
    }
}

/// Parse a positive record id typed into a form field.
pub fn parse_id(label: &str, value: &str) -> Result<i64, String> {
    match value.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("{} must be a positive number", label)),
    }
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{} must be in YYYY-MM-DD format", label))
}
