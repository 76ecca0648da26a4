//! Wire records for the books/authors API and the summaries shown in the catalog

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An author as returned by `/api/authors`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
}

/// Body of `POST /api/authors/`
#[derive(Clone, Debug, Serialize)]
pub struct AuthorCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Full book record (`BookResponse`)
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BookDetail {
    pub book_manage_id: String,
    pub id: String,
    pub title: String,
    pub isbn: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub page_count: Option<i64>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub table_of_contents: Option<String>,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub publisher_image: Option<String>,
    #[serde(default)]
    pub cover_image: String,
    pub author_id: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
}

impl BookDetail {
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map(|a| a.name.as_str()).unwrap_or(UNKNOWN_AUTHOR)
    }
}

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// One catalog row.
///
/// `id` is the book's management id, which is also the key every
/// `/api/books/{id}` route expects.
#[derive(Clone, Debug, PartialEq)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub price: Option<f64>,
    pub quantity: i64,
    pub cover_image: Option<String>,
}

impl BookSummary {
    pub fn author_name(&self) -> &str {
        self.author.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }
}

impl From<BookDetail> for BookSummary {
    fn from(book: BookDetail) -> Self {
        // The catalog shows the publisher image and falls back to the uploaded cover
        let cover_image = book
            .publisher_image
            .filter(|s| !s.is_empty())
            .or_else(|| Some(book.cover_image).filter(|s| !s.is_empty()));

        Self {
            id: book.book_manage_id,
            title: book.title,
            author: book.author.map(|a| a.name),
            price: book.price,
            quantity: book.quantity,
            cover_image,
        }
    }
}

/// Body of `POST /api/books/`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookCreate {
    pub book_manage_id: String,
    pub title: String,
    pub isbn: String,
    pub author_id: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_image: Option<String>,
}

/// Body of `PUT /api/books/{id}`. Fields left `None` are not sent and stay unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Management id the server expects for manually entered books
pub fn manual_book_id(isbn: &str) -> String {
    format!("Custom_{}", isbn)
}

/// Format a price as whole won with thousands separators, e.g. `12,500원`
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{}원", grouped)
    } else {
        format!("{}원", grouped)
    }
}

/// Render a server timestamp as `YYYY-MM-DD HH:MM`, or pass it through unchanged
/// when it is in neither RFC 3339 nor naive ISO form.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M";
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format(DISPLAY).to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format(DISPLAY).to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn detail_json() -> serde_json::Value {
        serde_json::json!({
            "book_manage_id": "Custom_9788937460449",
            "id": "6f1c",
            "title": "Dune",
            "isbn": "9788937460449",
            "price": 12500.0,
            "quantity": 3,
            "publisher_image": null,
            "cover_image": "http://localhost:9000/lms/media/cover/dune.jpg",
            "author_id": "a1",
            "author": {
                "id": "a1",
                "name": "Frank Herbert",
                "created": "2024-05-01T10:00:00",
                "modified": "2024-05-01T10:00:00"
            },
            "created": "2024-05-01T10:00:00.123456",
            "modified": "2024-05-02T11:30:00+09:00"
        })
    }

    #[rstest]
    fn summary_from_detail_keeps_catalog_fields() {
        let detail: BookDetail = serde_json::from_value(detail_json()).unwrap();
        let summary = BookSummary::from(detail);

        assert_eq!(summary.id, "Custom_9788937460449");
        assert_eq!(summary.author_name(), "Frank Herbert");
        assert_eq!(summary.price, Some(12500.0));
        assert_eq!(summary.quantity, 3);
        assert_eq!(
            summary.cover_image.as_deref(),
            Some("http://localhost:9000/lms/media/cover/dune.jpg")
        );
    }

    #[rstest]
    fn missing_author_falls_back_to_unknown() {
        let mut json = detail_json();
        json.as_object_mut().unwrap().remove("author");
        let detail: BookDetail = serde_json::from_value(json).unwrap();

        assert_eq!(detail.author_name(), UNKNOWN_AUTHOR);
        assert_eq!(BookSummary::from(detail).author_name(), UNKNOWN_AUTHOR);
    }

    #[rstest]
    #[case(0.0, "0원")]
    #[case(999.0, "999원")]
    #[case(12500.0, "12,500원")]
    #[case(1234567.4, "1,234,567원")]
    #[case(19999.5, "20,000원")]
    fn price_is_grouped_in_thousands(#[case] price: f64, #[case] expected: &str) {
        assert_eq!(format_price(price), expected);
    }

    #[rstest]
    #[case("2024-05-01T10:00:00.123456", "2024-05-01 10:00")]
    #[case("2024-05-02T11:30:00+09:00", "2024-05-02 11:30")]
    #[case("yesterday", "yesterday")]
    fn timestamps_are_shortened(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(format_timestamp(raw), expected);
    }

    #[rstest]
    fn update_skips_unset_fields() {
        let update = BookUpdate {
            price: Some(9000.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json, serde_json::json!({ "price": 9000.0 }));
        assert!(!update.is_empty());
        assert!(BookUpdate::default().is_empty());
    }
}
