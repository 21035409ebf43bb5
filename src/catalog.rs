use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api::RawBook;
use crate::domain::Book;
use crate::supplement::SupplementIndex;

/// The canonical merged record set. Order is the arrival order of the
/// fetch; every downstream selection preserves it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Why an incoming record was kept out of the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRejection {
    pub index: usize,
    pub reason: String,
}

/// Tighten wire records into `Book`s. A record without a usable title or an
/// integer-coercible year is quarantined instead of passed downstream.
pub fn ingest_records(raw: Vec<RawBook>) -> (Vec<Book>, Vec<RecordRejection>) {
    let mut books = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for (index, record) in raw.into_iter().enumerate() {
        match validate_record(record) {
            Ok(book) => books.push(book),
            Err(reason) => {
                debug!(index, %reason, "rejected catalog record");
                rejected.push(RecordRejection { index, reason });
            }
        }
    }
    (books, rejected)
}

fn validate_record(record: RawBook) -> Result<Book, String> {
    let title = match record.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => return Err("missing title".to_string()),
    };
    let year = record
        .year
        .as_ref()
        .and_then(coerce_year)
        .ok_or_else(|| "year is not an integer".to_string())?;
    Ok(Book {
        title,
        year,
        publisher: record.publisher.unwrap_or_default(),
        isbn: record.isbn.unwrap_or_default(),
        pages: record.pages.as_ref().and_then(coerce_pages).unwrap_or(0),
        image: None,
    })
}

/// Years compare numerically everywhere in this system; a digit string on
/// the wire is coerced, anything else is rejected.
fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => number.as_i64().and_then(|year| i32::try_from(year).ok()),
        Value::String(text) => text.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn coerce_pages(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|pages| u32::try_from(pages).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Join books against the cover index. Total: an unmatched book, or a match
/// whose image is empty, passes through unchanged. Order preserved.
pub fn merge_with_covers(books: Vec<Book>, index: &SupplementIndex) -> Catalog {
    let books = books
        .into_iter()
        .map(|mut book| {
            if let Some(entry) = index.lookup(&book.title) {
                if !entry.image.is_empty() {
                    book.image = Some(entry.image.clone());
                }
            }
            book
        })
        .collect();
    Catalog::new(books)
}
