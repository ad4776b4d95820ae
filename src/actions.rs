use chrono::NaiveDate;
use diesel::prelude::*;

use crate::db::AnyConnection;
use crate::models::{NewTask, NewUser, Task, User};

pub type DbError = Box<dyn std::error::Error + Send + Sync>;

/// Query to get all tasks owned by a user, earliest due date first.
pub fn find_tasks_for_user(conn: &mut AnyConnection, uid: i32) -> Result<Vec<Task>, DbError> {
    use crate::schema::tasks::dsl::*;

    let rows = tasks
        .filter(user_id.eq(uid))
        .order(due_date.asc())
        .load::<Task>(conn)?;

    Ok(rows)
}

/// Run query using Diesel to find a task by id and return it.
pub fn find_task_by_id(conn: &mut AnyConnection, task_id: i32) -> Result<Option<Task>, DbError> {
    use crate::schema::tasks::dsl::*;

    let task = tasks
        .filter(id.eq(task_id))
        .first::<Task>(conn)
        .optional()?;

    Ok(task)
}

/// Insert a new task row for `uid`. The write runs in its own transaction so
/// a failure leaves the table untouched.
pub fn insert_new_task(
    conn: &mut AnyConnection,
    uid: i32,
    new_title: &str,
    new_description: Option<&str>,
    new_due_date: NaiveDate,
) -> Result<(), DbError> {
    // Importing the schema dsl inside the function scope (rather than at
    // module scope) keeps the column names from colliding with locals.
    use crate::schema::tasks::dsl::*;

    let new_task = NewTask {
        user_id: uid,
        title: new_title,
        description: new_description,
        due_date: new_due_date,
        completed: false,
    };

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(tasks).values(&new_task).execute(conn)
    })?;

    Ok(())
}

/// Flip the `completed` flag of a task. Returns the task with its new state,
/// or `None` when no task has that id.
pub fn toggle_task_completed(
    conn: &mut AnyConnection,
    task_id: i32,
) -> Result<Option<Task>, DbError> {
    use crate::schema::tasks::dsl::*;

    let toggled = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let found = tasks
            .filter(id.eq(task_id))
            .first::<Task>(conn)
            .optional()?;

        let Some(mut task) = found else {
            return Ok(None);
        };

        task.completed = !task.completed;
        diesel::update(tasks.filter(id.eq(task_id)))
            .set(completed.eq(task.completed))
            .execute(conn)?;

        Ok(Some(task))
    })?;

    Ok(toggled)
}

/// Hard-delete a task. Returns `false` when no row matched the id.
pub fn delete_task(conn: &mut AnyConnection, task_id: i32) -> Result<bool, DbError> {
    use crate::schema::tasks::dsl::*;

    let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(tasks.filter(id.eq(task_id))).execute(conn)
    })?;

    Ok(deleted > 0)
}

pub fn find_user_by_id(conn: &mut AnyConnection, uid: i32) -> Result<Option<User>, DbError> {
    use crate::schema::users::dsl::*;

    let user = users.filter(id.eq(uid)).first::<User>(conn).optional()?;

    Ok(user)
}

pub fn insert_user(conn: &mut AnyConnection, new_user: &NewUser<'_>) -> Result<(), DbError> {
    use crate::schema::users::dsl::*;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(users).values(new_user).execute(conn)
    })?;

    Ok(())
}
