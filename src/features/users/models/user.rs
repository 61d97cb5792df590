use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::users::models::{FileAttachment, NewFileAttachment};

/// Database model for users
///
/// `attachments` is not a column; the repository fills it from
/// `file_attachments` on every read, ordered by position.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub attachments: Vec<FileAttachment>,
}

/// Candidate user, not yet persisted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub attachments: Vec<NewFileAttachment>,
}
