use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::features::users::models::{FileAttachment, NewUser, User};

/// Upper bound on bound ids per `IN (...)` batch, well under SQLite's
/// host-parameter limit
const ATTACHMENT_BATCH_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("user {0} not found")]
    NotFound(i64),

    #[error("storage error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// The user row was accepted but one of its attachments was not.
    /// The surrounding transaction is rolled back, so nothing is left behind.
    #[error("attachment {index} of user {user_id} could not be stored: {source}")]
    AttachmentWrite {
        user_id: i64,
        index: usize,
        source: sqlx::Error,
    },
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Persistence operations for users and the attachments they own.
///
/// Every read returns users with `attachments` populated.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All stored users in id order. An empty store yields an empty list.
    async fn list_users(&self) -> RepositoryResult<Vec<User>>;

    /// A single user, or `NotFound` when no row has this id.
    async fn get_user_by_id(&self, id: i64) -> RepositoryResult<User>;

    /// Store a user and its attachments as one unit.
    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User>;

    /// Hard-delete a user and its attachments. Returns the number of user
    /// rows removed; removing an absent id is not an error.
    async fn delete_user_by_id(&self, id: i64) -> RepositoryResult<u64>;
}

/// SQLite-backed repository
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fill `attachments` on each user with one batched query per
    /// `ATTACHMENT_BATCH_SIZE` users
    async fn load_attachments(&self, users: &mut [User]) -> RepositoryResult<()> {
        if users.is_empty() {
            return Ok(());
        }

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let mut by_user: HashMap<i64, Vec<FileAttachment>> = HashMap::new();

        for chunk in ids.chunks(ATTACHMENT_BATCH_SIZE) {
            let mut query = QueryBuilder::<Sqlite>::new(
                "SELECT id, user_id, file_id, position, file_bytes, created_at \
                 FROM file_attachments WHERE user_id IN (",
            );
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") ORDER BY user_id, position");

            let rows = query
                .build_query_as::<FileAttachment>()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to load attachments: {:?}", e);
                    RepositoryError::Persistence(e)
                })?;

            for row in rows {
                by_user.entry(row.user_id).or_default().push(row);
            }
        }

        for user in users.iter_mut() {
            user.attachments = by_user.remove(&user.id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        let mut users = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, created_at, updated_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list users: {:?}", e);
            RepositoryError::Persistence(e)
        })?;

        self.load_attachments(&mut users).await?;
        debug!("Listed {} users", users.len());

        Ok(users)
    }

    async fn get_user_by_id(&self, id: i64) -> RepositoryResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get user {}: {:?}", id, e);
            RepositoryError::Persistence(e)
        })?;

        let mut user = user.ok_or(RepositoryError::NotFound(id))?;
        self.load_attachments(std::slice::from_mut(&mut user))
            .await?;

        debug!(
            "Fetched user id={} with {} attachments",
            user.id,
            user.attachments.len()
        );

        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        let NewUser {
            first_name,
            last_name,
            attachments,
        } = new_user;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to open transaction: {:?}", e);
            RepositoryError::Persistence(e)
        })?;

        let mut user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, first_name, last_name, created_at, updated_at
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert user: {:?}", e);
            RepositoryError::Persistence(e)
        })?;

        let mut stored = Vec::with_capacity(attachments.len());
        for (index, attachment) in attachments.into_iter().enumerate() {
            let row = sqlx::query_as::<_, FileAttachment>(
                r#"
                INSERT INTO file_attachments (user_id, file_id, position, file_bytes, created_at)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id, user_id, file_id, position, file_bytes, created_at
                "#,
            )
            .bind(user.id)
            .bind(attachment.file_id)
            .bind(index as i64)
            .bind(attachment.file_bytes)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|source| {
                error!(
                    "Failed to insert attachment {} for user {}: {:?}",
                    index, user.id, source
                );
                RepositoryError::AttachmentWrite {
                    user_id: user.id,
                    index,
                    source,
                }
            })?;
            stored.push(row);
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit user {}: {:?}", user.id, e);
            RepositoryError::Persistence(e)
        })?;

        user.attachments = stored;
        info!(
            "User created: id={}, attachments={}",
            user.id,
            user.attachments.len()
        );

        Ok(user)
    }

    async fn delete_user_by_id(&self, id: i64) -> RepositoryResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to open transaction: {:?}", e);
            RepositoryError::Persistence(e)
        })?;

        let attachments_removed = sqlx::query("DELETE FROM file_attachments WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to delete attachments of user {}: {:?}", id, e);
                RepositoryError::Persistence(e)
            })?
            .rows_affected();

        let users_removed = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to delete user {}: {:?}", id, e);
                RepositoryError::Persistence(e)
            })?
            .rows_affected();

        tx.commit().await.map_err(|e| {
            error!("Failed to commit delete of user {}: {:?}", id, e);
            RepositoryError::Persistence(e)
        })?;

        if users_removed == 0 {
            debug!("Delete of user {} matched no rows", id);
        } else {
            info!(
                "User deleted: id={}, attachments={}",
                id, attachments_removed
            );
        }

        Ok(users_removed)
    }
}
