use serde::{Deserialize, Serialize};

use super::common::string_or_number;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(alias = "id")]
    pub book_id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub publication_year: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, alias = "available")]
    pub available_copies: Option<i64>,
}

impl Book {
    pub fn author_display(&self) -> &str {
        self.author.as_deref().unwrap_or("Unknown author")
    }

    pub fn year_display(&self) -> &str {
        self.publication_year.as_deref().unwrap_or("-")
    }
}

/// A book submitted from the add-book form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publication_year: String,
}

impl NewBook {
    /// Check the form values before sending them.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.author.trim().is_empty() {
            return Err("Author is required".to_string());
        }
        let year = self.publication_year.trim();
        if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) || year.len() > 4 {
            return Err("Publication year must be a year such as 1999".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_book_variants() {
        let json = r#"{"book_id": 3, "title": "Dune", "author": "Frank Herbert", "publication_year": 1965,
            "description": "Desert planet", "image_url": "http://img/dune.jpg"}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.book_id, 3);
        assert_eq!(book.year_display(), "1965");
        assert_eq!(book.author_display(), "Frank Herbert");

        // Older endpoints use `id` and string years
        let json = r#"{"id": 9, "title": "Emma", "publication_year": "1815"}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.book_id, 9);
        assert_eq!(book.publication_year.as_deref(), Some("1815"));
        assert_eq!(book.author_display(), "Unknown author");
        assert_eq!(book.image_url, None);
    }

    #[test]
    fn test_new_book_validation() {
        let mut book = NewBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publication_year: "1965".to_string(),
        };
        assert!(book.validate().is_ok());

        book.publication_year = "19x5".to_string();
        assert!(book.validate().is_err());

        book.publication_year = "1965".to_string();
        book.title = "  ".to_string();
        assert_eq!(book.validate(), Err("Title is required".to_string()));
    }

    #[test]
    fn test_new_book_serializes_form_fields() {
        let book = NewBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publication_year: "1965".to_string(),
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "Dune", "author": "Frank Herbert", "publication_year": "1965"})
        );
    }
}
