//! Database context for managing the connection factory and repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::pool::{AsyncSqlitePool, DieselError};
use super::projects::ProjectRepository;
use super::texts::TextRepository;

/// Create one context per command or server, then use it to reach every
/// repository.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url(&settings.database_url());
/// ctx.init_schema().await?;
/// let texts = ctx.texts().list(None).await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a context from a database URL or path.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Create a context from a file path.
    pub fn from_path(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    pub fn texts(&self) -> TextRepository {
        TextRepository::new(self.pool.clone())
    }

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.pool.clone())
    }

    /// Create tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS handwritten_texts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                embedding TEXT,
                provider TEXT NOT NULL,
                project_id INTEGER REFERENCES projects(id)
            );

            CREATE INDEX IF NOT EXISTS idx_texts_project ON handwritten_texts(project_id);
            CREATE INDEX IF NOT EXISTS idx_texts_created ON handwritten_texts(created_at);
            "#,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();
        assert_eq!(ctx.texts().count(None).await.unwrap(), 0);
    }
}
