use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::core::database::run_migrations;
use crate::features::users::models::{NewUser, User};
use crate::features::users::repositories::{RepositoryError, RepositoryResult, UserRepository};

/// Empty in-memory database without any tables.
///
/// A single connection that never expires, so every query sees the same
/// in-memory store.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap()
}

/// In-memory database with the schema registered
pub async fn test_pool() -> SqlitePool {
    let pool = memory_pool().await;
    run_migrations(&pool).await.unwrap();
    pool
}

/// Repository double that counts calls and either answers with an empty
/// store or fails every operation with a storage error
#[derive(Default)]
pub struct RecordingUserRepository {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingUserRepository {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> RepositoryResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(RepositoryError::Persistence(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserRepository for RecordingUserRepository {
    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        self.record()?;
        Ok(Vec::new())
    }

    async fn get_user_by_id(&self, id: i64) -> RepositoryResult<User> {
        self.record()?;
        Err(RepositoryError::NotFound(id))
    }

    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        self.record()?;
        let now = chrono::Utc::now();
        Ok(User {
            id: 1,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            created_at: now,
            updated_at: now,
            attachments: Vec::new(),
        })
    }

    async fn delete_user_by_id(&self, _id: i64) -> RepositoryResult<u64> {
        self.record()?;
        Ok(0)
    }
}
