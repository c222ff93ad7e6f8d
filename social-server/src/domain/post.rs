use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) author_id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) image: Option<String>,
    pub(crate) category: String,
    pub(crate) likes: Vec<i64>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) post_id: i64,
    pub(crate) author_id: i64,
    /// Display name captured from the commenter's token at creation time,
    /// never re-resolved afterwards.
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) image: Option<String>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            description: normalize_description(&self.description)?,
            category: normalize_category(&self.category)?,
            image: self.image,
        })
    }
}

/// Partial post update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) image: Option<String>,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: self.title.map(|value| normalize_title(&value)).transpose()?,
            description: self
                .description
                .map(|value| normalize_description(&value))
                .transpose()?,
            category: self
                .category
                .map(|value| normalize_category(&value))
                .transpose()?,
            image: self.image,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CommentRequest {
    pub(crate) text: String,
}

impl CommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let text = self.text.trim();
        if text.is_empty() || text.chars().count() > 500 {
            return Err(DomainError::Validation {
                field: "text",
                message: "must be 1..500 chars",
            });
        }
        Ok(Self {
            text: text.to_string(),
        })
    }
}

/// Which authors a post search covers, relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SearchFilter {
    /// Caller's own posts plus posts from followed users.
    #[default]
    MineAndFollowed,
    OnlyMine,
    ExcludeMine,
}

impl SearchFilter {
    pub(crate) fn parse(value: Option<&str>) -> Self {
        match value {
            Some("only-my-posts") => SearchFilter::OnlyMine,
            Some("exclude-my-posts") => SearchFilter::ExcludeMine,
            _ => SearchFilter::MineAndFollowed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PostSort {
    /// Ascending title.
    #[default]
    Title,
    /// Most recent first.
    Date,
    /// Ascending author username.
    Username,
}

impl PostSort {
    pub(crate) fn parse(value: Option<&str>) -> Self {
        match value {
            Some("date") => PostSort::Date,
            Some("username") => PostSort::Username,
            _ => PostSort::Title,
        }
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > 100 {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..100 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_category(category: &str) -> Result<String, DomainError> {
    let category = category.trim();
    if category.is_empty() || category.chars().count() > 100 {
        return Err(DomainError::Validation {
            field: "category",
            message: "must be 1..100 chars",
        });
    }
    Ok(category.to_string())
}

fn normalize_description(description: &str) -> Result<String, DomainError> {
    let description = description.trim();
    if description.chars().count() > 500 {
        return Err(DomainError::Validation {
            field: "description",
            message: "must be at most 500 chars",
        });
    }
    Ok(description.to_string())
}
