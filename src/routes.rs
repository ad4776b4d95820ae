use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, ContentType};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{error, get, post, web, HttpResponse, Responder};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use askama_actix::Template;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::actions;
use crate::db::{DbPool, SEED_USER_ID};
use crate::models::Task;

/// A flash message flattened for the template: CSS class + text.
struct Flash {
    level: &'static str,
    text: String,
}

impl Flash {
    fn from_messages(messages: &IncomingFlashMessages) -> Vec<Flash> {
        messages
            .iter()
            .map(|message| Flash {
                level: match message.level() {
                    Level::Success => "success",
                    Level::Warning => "warning",
                    Level::Error => "error",
                    _ => "info",
                },
                text: message.content().to_string(),
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    incomplete_tasks: Vec<Task>,
    completed_tasks: Vec<Task>,
    today: NaiveDate,
    flashes: Vec<Flash>,
}

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "500.html")]
struct ServerErrorTemplate;

/// Form body of `POST /add`. Every field is defaulted so a missing field
/// reads as empty and goes through the same validation as a blank one.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due_date: String,
}

fn redirect_to_index() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

fn render_not_found() -> actix_web::Result<HttpResponse> {
    let body = NotFoundTemplate
        .render()
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NotFound()
        .content_type(ContentType::html())
        .body(body))
}

/// List view: all tasks for the seed user, split into incomplete/completed.
#[get("/")]
pub async fn index(
    pool: web::Data<DbPool>,
    messages: IncomingFlashMessages,
) -> actix_web::Result<impl Responder> {
    let tasks = web::block(move || {
        let mut conn = pool.get()?;
        actions::find_tasks_for_user(&mut conn, SEED_USER_ID)
    })
    .await?
    // map diesel query errors to a 500 error response
    .map_err(error::ErrorInternalServerError)?;

    let (incomplete_tasks, completed_tasks): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(|task| !task.completed);

    Ok(IndexTemplate {
        incomplete_tasks,
        completed_tasks,
        today: Local::now().date_naive(),
        flashes: Flash::from_messages(&messages),
    })
}

/// Creates a new task from the submitted form, then redirects back to `/`.
#[post("/add")]
pub async fn add_task(
    pool: web::Data<DbPool>,
    form: web::Form<TaskForm>,
) -> actix_web::Result<impl Responder> {
    let form = form.into_inner();
    let title = form.title.trim().to_owned();
    let description = form.description.trim().to_owned();
    let due_date_raw = form.due_date.trim().to_owned();

    if title.is_empty() || due_date_raw.is_empty() {
        FlashMessage::error("Title and due date are required").send();
        return Ok(redirect_to_index());
    }

    let due_date = match NaiveDate::parse_from_str(&due_date_raw, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            FlashMessage::error("Due date must look like YYYY-MM-DD").send();
            return Ok(redirect_to_index());
        }
    };

    let result = web::block(move || {
        let mut conn = pool.get()?;
        let description = (!description.is_empty()).then_some(description.as_str());
        actions::insert_new_task(&mut conn, SEED_USER_ID, &title, description, due_date)
    })
    .await?;

    match result {
        Ok(()) => FlashMessage::success("Task added!").send(),
        Err(err) => {
            log::error!("failed to insert task: {err}");
            FlashMessage::error("Something went wrong while saving the task").send();
        }
    }

    Ok(redirect_to_index())
}

/// Flips the completed flag of a task, or renders the not-found page.
#[get("/toggle/{task_id}")]
pub async fn toggle_task(
    pool: web::Data<DbPool>,
    task_id: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let task_id = task_id.into_inner();
    let result = web::block(move || {
        let mut conn = pool.get()?;
        actions::toggle_task_completed(&mut conn, task_id)
    })
    .await?;

    match result {
        Ok(Some(task)) => {
            let status = if task.completed { "complete" } else { "incomplete" };
            FlashMessage::success(format!("Marked '{}' as {status}", task.title)).send();
        }
        Ok(None) => return render_not_found(),
        Err(err) => {
            log::error!("failed to toggle task {task_id}: {err}");
            FlashMessage::error("Something went wrong while updating the task").send();
        }
    }

    Ok(redirect_to_index())
}

/// Hard-deletes a task, or renders the not-found page.
#[get("/delete/{task_id}")]
pub async fn delete_task(
    pool: web::Data<DbPool>,
    task_id: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let task_id = task_id.into_inner();
    let result = web::block(move || {
        let mut conn = pool.get()?;
        actions::delete_task(&mut conn, task_id)
    })
    .await?;

    match result {
        Ok(true) => FlashMessage::success("Task deleted").send(),
        Ok(false) => return render_not_found(),
        Err(err) => {
            log::error!("failed to delete task {task_id}: {err}");
            FlashMessage::error("Something went wrong while deleting the task").send();
        }
    }

    Ok(redirect_to_index())
}

/// Catch-all for unmatched routes.
pub async fn not_found() -> actix_web::Result<HttpResponse> {
    render_not_found()
}

/// Rewrites any 500 response into the server-error page. Transactions roll
/// back inside the persistence layer, so this only has to render.
pub fn render_server_error<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let body = ServerErrorTemplate
        .render()
        .unwrap_or_else(|_| String::from("Something went wrong on our side."));

    let (req, res) = res.into_parts();
    let mut res = res.set_body(body);
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/html; charset=utf-8"),
    );

    let res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();

    Ok(ErrorHandlerResponse::Response(res))
}
