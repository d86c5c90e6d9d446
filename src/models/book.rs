use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::genre::Genre;
use crate::domain::Validate;

// DTO as returned by GET /books/{id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Denormalized at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
}

impl Validate for Book {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("book {} has an empty title", self.id));
        }
        self.genre.validate()
    }
}

/// Body of POST /books and PATCH /books/{id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub description: String,
    pub summary: String,
    pub genre_id: i64,
}

/// Fallback genre when an edited book carries none
pub const DEFAULT_GENRE_ID: i64 = 1;

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            published_at: book.published_at,
            description: book.description.clone(),
            summary: book.summary.clone().unwrap_or_default(),
            genre_id: book.genre.as_ref().map_or(DEFAULT_GENRE_ID, |g| g.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreated {
    pub message: String,
    pub book: Book,
}

impl Validate for BookCreated {
    fn validate(&self) -> Result<(), String> {
        self.book.validate()
    }
}
