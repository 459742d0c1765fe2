//! Lendable catalog item

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Copies given to an item created without an explicit count
pub const DEFAULT_COPIES: i32 = 1;

/// Largest copy count an admin may set
pub const MAX_COPIES: i32 = 1_000_000;

/// Catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_date: NaiveDate,
    /// Copies currently on the shelf, never negative
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create item request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItem {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub published_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = 1_000_000, message = "availableCopies must be between 0 and 1000000"))]
    pub available_copies: Option<i32>,
}

/// Item fields after presence checks
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_date: NaiveDate,
    pub available_copies: i32,
}

impl TryFrom<CreateItem> for NewItem {
    type Error = AppError;

    fn try_from(request: CreateItem) -> AppResult<Self> {
        request.validate()?;

        let text = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        match (
            text(request.title),
            text(request.author),
            text(request.genre),
            request.published_date,
        ) {
            (Some(title), Some(author), Some(genre), Some(published_date)) => Ok(Self {
                title,
                author,
                genre,
                published_date,
                available_copies: request.available_copies.unwrap_or(DEFAULT_COPIES),
            }),
            _ => Err(AppError::BadRequest(
                "title, author, genre and publishedDate are required".to_string(),
            )),
        }
    }
}

/// Partial item update. A present value is applied even when it is zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, message = "genre must not be empty"))]
    pub genre: Option<String>,
    pub published_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = 1_000_000, message = "availableCopies must be between 0 and 1000000"))]
    pub available_copies: Option<i32>,
}

impl Item {
    /// Apply a partial update in place
    pub fn apply(&mut self, changes: &UpdateItem) {
        if let Some(ref title) = changes.title {
            self.title = title.clone();
        }
        if let Some(ref author) = changes.author {
            self.author = author.clone();
        }
        if let Some(ref genre) = changes.genre {
            self.genre = genre.clone();
        }
        if let Some(published_date) = changes.published_date {
            self.published_date = published_date;
        }
        if let Some(available_copies) = changes.available_copies {
            self.available_copies = available_copies;
        }
    }
}
