//! Stored text repository.

use chrono::{SecondsFormat, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{LastInsertRowId, NewText, TextRecord};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use super::util::{decode_embedding, encode_embedding};
use crate::models::{ExtractionResult, StoredText};
use crate::schema::handwritten_texts;

impl From<TextRecord> for StoredText {
    fn from(record: TextRecord) -> Self {
        StoredText {
            id: record.id,
            filename: record.filename,
            text: record.text,
            created_at: parse_datetime(&record.created_at),
            provider: record.provider,
            project_id: record.project_id,
            embedding: decode_embedding(record.embedding.as_deref()),
        }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for extracted texts.
#[derive(Clone)]
pub struct TextRepository {
    pool: AsyncSqlitePool,
}

impl TextRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Persist an extraction result.
    pub async fn insert(
        &self,
        result: &ExtractionResult,
        filename: Option<&str>,
        project_id: Option<i32>,
    ) -> Result<StoredText, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let embedding = result.embedding.as_deref().map(encode_embedding);
        let record = NewText {
            filename,
            text: &result.text,
            created_at: &created_at,
            embedding: embedding.as_deref(),
            provider: &result.provider,
            project_id,
        };

        diesel::insert_into(handwritten_texts::table)
            .values(&record)
            .execute(&mut conn)
            .await?;

        let id = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result::<LastInsertRowId>(&mut conn)
            .await?
            .id as i32;

        Ok(StoredText {
            id,
            filename: filename.map(str::to_string),
            text: result.text.clone(),
            created_at: parse_datetime(&created_at),
            provider: result.provider.clone(),
            project_id,
            embedding: result.embedding.clone(),
        })
    }

    /// Get a stored text by ID.
    pub async fn get(&self, id: i32) -> Result<Option<StoredText>, DieselError> {
        let mut conn = self.pool.get().await?;

        handwritten_texts::table
            .find(id)
            .select(TextRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(StoredText::from))
    }

    /// List texts, newest first.
    pub async fn list(&self, project_id: Option<i32>) -> Result<Vec<StoredText>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = handwritten_texts::table
            .select(TextRecord::as_select())
            .order((handwritten_texts::created_at.desc(), handwritten_texts::id.desc()))
            .into_boxed();
        if let Some(pid) = project_id {
            query = query.filter(handwritten_texts::project_id.eq(pid));
        }

        query
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(StoredText::from).collect())
    }

    /// List texts, oldest first.
    pub async fn list_oldest_first(&self, project_id: Option<i32>) -> Result<Vec<StoredText>, DieselError> {
        let mut texts = self.list(project_id).await?;
        texts.reverse();
        Ok(texts)
    }

    /// Case-insensitive substring search, newest first.
    pub async fn search(&self, query: &str, project_id: Option<i32>) -> Result<Vec<StoredText>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut stmt = handwritten_texts::table
            .select(TextRecord::as_select())
            .filter(handwritten_texts::text.like(like_pattern(query)).escape('\\'))
            .order((handwritten_texts::created_at.desc(), handwritten_texts::id.desc()))
            .into_boxed();
        if let Some(pid) = project_id {
            stmt = stmt.filter(handwritten_texts::project_id.eq(pid));
        }

        stmt.load(&mut conn)
            .await
            .map(|records| records.into_iter().map(StoredText::from).collect())
    }

    /// Texts that carry an embedding, in insertion order.
    ///
    /// This is the snapshot similarity ranking runs over.
    pub async fn with_embeddings(&self, project_id: Option<i32>) -> Result<Vec<StoredText>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = handwritten_texts::table
            .select(TextRecord::as_select())
            .filter(handwritten_texts::embedding.is_not_null())
            .order(handwritten_texts::id.asc())
            .into_boxed();
        if let Some(pid) = project_id {
            query = query.filter(handwritten_texts::project_id.eq(pid));
        }

        let records = query.load(&mut conn).await?;
        Ok(records
            .into_iter()
            .map(StoredText::from)
            .filter(|t| t.embedding.is_some())
            .collect())
    }

    /// Count stored texts.
    pub async fn count(&self, project_id: Option<i32>) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = handwritten_texts::table.count().into_boxed();
        if let Some(pid) = project_id {
            query = query.filter(handwritten_texts::project_id.eq(pid));
        }
        query.get_result(&mut conn).await
    }
}
