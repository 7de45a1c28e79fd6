use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AvailabilityReport {
    #[serde(default)]
    pub total_books: i64,
    #[serde(default)]
    pub total_borrowed_books: i64,
    #[serde(default)]
    pub total_available_books: i64,
}

impl AvailabilityReport {
    /// Share of the collection currently on loan, as a percentage
    pub fn borrowed_percent(&self) -> f64 {
        if self.total_books <= 0 {
            0.0
        } else {
            self.total_borrowed_books as f64 * 100.0 / self.total_books as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueItem {
    pub loan_id: i64,
    pub book_title: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub days_overdue: i64,
    #[serde(default)]
    pub fine_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverdueReport {
    #[serde(default)]
    pub overdue_items: Vec<OverdueItem>,
    #[serde(default)]
    pub total_fine: f64,
}
