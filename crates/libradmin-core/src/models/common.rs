use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pagination {
    #[serde(rename = "totalPages", alias = "total_pages", default)]
    pub total_pages: u32,
    #[serde(rename = "currentPage", alias = "current_page", alias = "page", default)]
    pub current_page: Option<u32>,
    #[serde(rename = "totalItems", alias = "total_items", alias = "total", default)]
    pub total_items: Option<u64>,
}

/// List endpoints answer either with a bare array or with `{ data, pagination }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged {
        data: Vec<T>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Bare(Vec<T>),
}

/// One page of a list, whichever shape the service answered with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    /// Total pages, treating an unpaginated answer as a single page
    pub fn total_pages(&self) -> u32 {
        self.pagination
            .as_ref()
            .map(|p| p.total_pages)
            .unwrap_or(1)
            .max(1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        match response {
            ListResponse::Paged { data, pagination } => Page {
                items: data,
                pagination,
            },
            ListResponse::Bare(items) => Page {
                items,
                pagination: None,
            },
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ListResponse::deserialize(deserializer).map(Page::from)
    }
}

/// `{ "data": ... }` wrapper used by some report endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Acknowledgement of a mutating call whose body shape is not fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accept a JSON string or number, keeping it as text.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_bare_array() {
        let page: Page<u32> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.pagination, None);
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_page_from_envelope() {
        let json = r#"{"data": [7], "pagination": {"totalPages": 4, "currentPage": 2, "totalItems": 19}}"#;
        let page: Page<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items, vec![7]);
        assert_eq!(page.total_pages(), 4);
        assert_eq!(page.pagination.unwrap().total_items, Some(19));
    }

    #[test]
    fn test_page_envelope_without_pagination() {
        let page: Page<u32> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_ack_keeps_extra_fields() {
        let ack: Ack = serde_json::from_str(r#"{"message": "ok", "loan_id": 12}"#).unwrap();
        assert_eq!(ack.message.as_deref(), Some("ok"));
        assert_eq!(ack.extra.get("loan_id"), Some(&serde_json::json!(12)));

        let empty: Ack = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Ack::default());
    }
}
