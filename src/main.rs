//! Actix Web Diesel task tracker
//!
//! Diesel v2 is not an async library, so queries are executed in `web::block`
//! closures which offload blocking code (like Diesel's) to a thread-pool in
//! order to not block the server.

use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::middleware::{self, ErrorHandlers};
use actix_web::{web, App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;

mod actions;
mod config;
mod db;
mod models;
mod routes;
mod schema;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // initialize DB pool outside of `HttpServer::new` so that it is shared
    // across all workers
    let pool = db::initialize_db_pool(&config::database_url());

    {
        let mut conn = pool.get().expect("couldn't get db connection from pool");
        db::initialize_schema(&mut conn).expect("schema setup should succeed");
    }

    // Signing key for the flash-message cookie. Messages only live across a
    // single redirect, so a fresh key per process is enough.
    let message_store = CookieMessageStore::builder(Key::generate()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    log::info!("starting HTTP server at http://0.0.0.0:5000");

    HttpServer::new(move || {
        App::new()
            // add DB pool handle to app data; enables use of `web::Data<DbPool>` extractor
            .app_data(web::Data::new(pool.clone()))
            .wrap(message_framework.clone())
            // add request logger middleware
            .wrap(middleware::Logger::default())
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::INTERNAL_SERVER_ERROR, routes::render_server_error),
            )
            // add route handlers
            .service(routes::index)
            .service(routes::add_task)
            .service(routes::toggle_task)
            .service(routes::delete_task)
            .default_service(web::route().to(routes::not_found))
    })
    .bind(("0.0.0.0", 5000))?
    .run()
    .await
}
