//! Project management.

use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::models::Project;
use crate::repository::DbContext;

pub struct ProjectService {
    db: DbContext,
}

impl ProjectService {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    /// Create a project with a unique, non-blank name.
    pub async fn create(&self, name: &str, description: Option<&str>) -> ServiceResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("Project name must not be empty".to_string()));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        let project = self
            .db
            .projects()
            .create(name, description)
            .await
            .map_err(|e| ServiceError::from_insert(e, "Project with this name already exists"))?;
        info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.db.projects().list().await?)
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Project> {
        self.db
            .projects()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))
    }

    /// Resolve a project given by numeric ID or by name.
    pub async fn resolve(&self, id_or_name: &str) -> ServiceResult<Project> {
        if let Ok(id) = id_or_name.trim().parse::<i32>() {
            return self.get(id).await;
        }
        self.db
            .projects()
            .get_by_name(id_or_name.trim())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Project '{}' not found", id_or_name)))
    }
}
