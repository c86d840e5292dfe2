use crate::{
    auth::{SignInRequest, SignUpRequest},
    error::AppError,
    models::UserFilterQuery,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Responds `201 Created` with an empty body, `400` on invalid input and
/// `409 Conflict` when the username is taken.
#[post("/signup")]
pub async fn sign_up(
    state: web::Data<AppState>,
    body: web::Json<SignUpRequest>,
) -> Result<impl Responder, AppError> {
    state.auth.sign_up(body.into_inner()).await?;
    Ok(HttpResponse::Created().finish())
}

/// Sign in
///
/// Responds `200 OK` with `{"accessToken": "..."}`, or `401` on bad credentials.
#[post("/signin")]
pub async fn sign_in(
    state: web::Data<AppState>,
    body: web::Json<SignInRequest>,
) -> Result<impl Responder, AppError> {
    let response = state.auth.sign_in(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Filter users by badge flags and delivery/pickup type.
///
/// ## Query Parameters:
/// - `filter` (optional): comma-separated badges (`certified`, `isPartner`).
/// - `type` (optional): `delivery`, `pickup` or both (the default).
#[get("/filtering")]
pub async fn filtering(
    state: web::Data<AppState>,
    query: web::Query<UserFilterQuery>,
) -> Result<impl Responder, AppError> {
    let users = state.auth.filter_users(&query).await?;
    Ok(HttpResponse::Ok().json(users))
}
