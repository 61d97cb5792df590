use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a binary attachment owned by a user
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct FileAttachment {
    pub id: i64,
    /// Owning user; the only association key
    pub user_id: i64,
    /// Caller-assigned identifier, stored as given
    pub file_id: i64,
    pub position: i64,
    pub file_bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Attachment payload supplied with a user create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileAttachment {
    pub file_id: i64,
    pub file_bytes: Vec<u8>,
}
