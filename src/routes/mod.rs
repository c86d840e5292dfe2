pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers the `/auth` and `/tasks` scopes. `/tasks` requires a bearer token.
///
/// Malformed JSON bodies and query strings are answered with the same
/// `{"error": ...}` body as every other client error. A path id that does not
/// parse cannot name a task, so it is a 404.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("Task not found".into()).into()),
    )
    .service(
        web::scope("/auth")
            .service(auth::sign_up)
            .service(auth::sign_in)
            .service(auth::filtering),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::enqueue_job)
            .service(tasks::get_task)
            .service(tasks::delete_task)
            .service(tasks::update_task_status),
    );
}
