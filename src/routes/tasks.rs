use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{StatusUpdate, TaskInput, TaskQuery},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `OPEN`, `IN_PROGRESS` or `DONE`, in any case.
/// - `search` (optional): text that must appear in the title or description (case-sensitive).
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects, oldest first.
/// - `400 Bad Request`: unknown status.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list(&user.0, &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// The task starts as `OPEN`. A deferred job carrying the request data is
/// enqueued alongside it; the response does not wait for that job.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: missing or invalid title/description.
/// - `401 Unauthorized`: missing or invalid token.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    body: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.create(body.into_inner(), &user.0).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Enqueues a deferred job without creating a task.
#[post("/queue")]
pub async fn enqueue_job(
    state: web::Data<AppState>,
    body: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let job = state.tasks.enqueue(body.into_inner(), &user.0).await?;
    Ok(HttpResponse::Accepted().json(json!({
        "id": job.id,
        "run_at": job.run_at,
    })))
}

/// Retrieves one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(task_id.into_inner(), &user.0).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes one of the authenticated user's tasks.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(task_id.into_inner(), &user.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Changes a task's status.
///
/// ## Request Body:
/// `{"status": "done"}`; the value is case-insensitive.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: the status is not `OPEN`, `IN_PROGRESS` or `DONE`.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[patch("/{id}/status")]
pub async fn update_task_status(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update_status(task_id.into_inner(), &body.status, &user.0)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}
