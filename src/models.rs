use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{tasks, users};

/// Account that owns tasks. Only the seed user ever exists.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
}

/// User details for the seed-user insert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: i32,
    pub username: &'a str,
    pub email: Option<&'a str>,
}

/// A tracked task, read straight from the `tasks` table.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

/// New task details. `id` and `created_at` are filled in by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub due_date: NaiveDate,
    pub completed: bool,
}
