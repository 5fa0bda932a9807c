//! Project repository.

use chrono::{SecondsFormat, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{LastInsertRowId, NewProject, ProjectRecord};
use super::parse_datetime;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::Project;
use crate::schema::{handwritten_texts, projects};

impl From<ProjectRecord> for Project {
    fn from(record: ProjectRecord) -> Self {
        Project {
            id: record.id,
            name: record.name,
            description: record.description,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Repository for projects.
#[derive(Clone)]
pub struct ProjectRepository {
    pool: AsyncSqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create a project. Names are unique; a duplicate name fails with a
    /// `UniqueViolation` database error.
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Project, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        diesel::insert_into(projects::table)
            .values(&NewProject {
                name,
                description,
                created_at: &created_at,
            })
            .execute(&mut conn)
            .await?;

        let id = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result::<LastInsertRowId>(&mut conn)
            .await?
            .id as i32;

        Ok(Project {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: parse_datetime(&created_at),
        })
    }

    /// Get a project by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Project>, DieselError> {
        let mut conn = self.pool.get().await?;

        projects::table
            .find(id)
            .select(ProjectRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Project::from))
    }

    /// Get a project by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Project>, DieselError> {
        let mut conn = self.pool.get().await?;

        projects::table
            .filter(projects::name.eq(name))
            .select(ProjectRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Project::from))
    }

    /// List projects, newest first.
    pub async fn list(&self) -> Result<Vec<Project>, DieselError> {
        let mut conn = self.pool.get().await?;

        projects::table
            .select(ProjectRecord::as_select())
            .order((projects::created_at.desc(), projects::id.desc()))
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Project::from).collect())
    }

    /// Every project with the number of texts it holds.
    pub async fn text_counts(&self) -> Result<Vec<(Project, i64)>, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(ProjectRecord, Option<i32>)> = projects::table
            .left_join(handwritten_texts::table)
            .select((ProjectRecord::as_select(), handwritten_texts::id.nullable()))
            .load(&mut conn)
            .await?;

        let mut counts: Vec<(Project, i64)> = Vec::new();
        for (record, text_id) in rows {
            let hit = i64::from(text_id.is_some());
            match counts.iter_mut().find(|(p, _)| p.id == record.id) {
                Some((_, n)) => *n += hit,
                None => counts.push((Project::from(record), hit)),
            }
        }
        Ok(counts)
    }
}
