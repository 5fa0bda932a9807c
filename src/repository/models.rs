//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Project record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProjectRecord {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// New project for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::projects)]
pub struct NewProject<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub created_at: &'a str,
}

/// Stored text record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::handwritten_texts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TextRecord {
    pub id: i32,
    pub filename: Option<String>,
    pub text: String,
    pub created_at: String,
    pub embedding: Option<String>,
    pub provider: String,
    pub project_id: Option<i32>,
}

/// New stored text for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::handwritten_texts)]
pub struct NewText<'a> {
    pub filename: Option<&'a str>,
    pub text: &'a str,
    pub created_at: &'a str,
    pub embedding: Option<&'a str>,
    pub provider: &'a str,
    pub project_id: Option<i32>,
}

#[derive(QueryableByName)]
pub(crate) struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}
