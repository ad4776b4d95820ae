//! Connection pool setup and idempotent schema bootstrap.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager};

use crate::actions::{self, DbError};
use crate::models::NewUser;

/// The one account all tasks are attributed to.
pub const SEED_USER_ID: i32 = 1;

/// Runtime-selected database backend. Deployments talk to PostgreSQL via the
/// `DB_*` settings; tests and local development can point `DATABASE_URL` at a
/// SQLite file instead. Connection URLs are tried against each backend in
/// declaration order.
#[derive(diesel::MultiConnection)]
pub enum AnyConnection {
    Postgresql(diesel::PgConnection),
    Sqlite(diesel::SqliteConnection),
}

/// Short-hand for the database pool type to use throughout the app.
pub type DbPool = r2d2::Pool<ConnectionManager<AnyConnection>>;

const PG_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    username VARCHAR(80) UNIQUE NOT NULL,
    email VARCHAR(120),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS tasks (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(200) NOT NULL,
    description TEXT,
    due_date DATE NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

const SQLITE_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    due_date DATE NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

/// Initialize the database connection pool for the given connection URL.
pub fn initialize_db_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<AnyConnection>::new(database_url);
    r2d2::Pool::builder()
        .build(manager)
        .expect("database URL should point at a reachable database")
}

/// Create the `users` and `tasks` tables if they are missing and make sure
/// the seed user exists. Safe to run on every startup.
pub fn initialize_schema(conn: &mut AnyConnection) -> Result<(), DbError> {
    let ddl = match conn {
        AnyConnection::Postgresql(_) => PG_SCHEMA,
        AnyConnection::Sqlite(_) => SQLITE_SCHEMA,
    };
    conn.batch_execute(ddl)?;

    if actions::find_user_by_id(conn, SEED_USER_ID)?.is_none() {
        let seed = NewUser {
            id: SEED_USER_ID,
            username: "admin",
            email: Some("admin@example.com"),
        };
        actions::insert_user(conn, &seed)?;
        log::info!("created seed user '{}'", seed.username);
    }

    Ok(())
}
