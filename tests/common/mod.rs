//! Shared setup for the integration tests: an app wired to in-memory stores
//! and queue, plus request helpers.
#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use taskboard::auth::AuthResponse;
use taskboard::models::Task;
use taskboard::queue::InMemoryJobQueue;
use taskboard::routes::{self, health};
use taskboard::store::{InMemoryTaskStore, InMemoryUserStore};
use taskboard::{AppState, Config};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Password123!";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        redis_url: None,
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
        cors_origin: None,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expires_in_secs: 3600,
        bcrypt_cost: 4,
        job_delay: Duration::from_secs(10),
        worker_enabled: false,
        worker_poll_interval: Duration::from_millis(50),
        worker_batch_size: 10,
    }
}

/// In-memory backends kept alongside the state so tests can inspect them.
pub struct TestContext {
    pub state: web::Data<AppState>,
    pub users: Arc<InMemoryUserStore>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub queue: Arc<InMemoryJobQueue>,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = test_config();
        let users = Arc::new(InMemoryUserStore::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        let state = AppState::new(users.clone(), tasks.clone(), queue.clone(), &config);

        Self {
            state: web::Data::new(state),
            users,
            tasks,
            queue,
            config,
        }
    }
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::config),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn sign_up<S, B>(app: &S, username: &str, password: &str) -> StatusCode
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    test::call_service(app, req).await.status()
}

/// Signs up (ignoring conflicts) and signs in, returning the access token.
pub async fn register_and_sign_in<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let status = sign_up(app, username, PASSWORD).await;
    assert!(
        status == StatusCode::CREATED || status == StatusCode::CONFLICT,
        "sign-up for {} failed with {}",
        username,
        status
    );

    let req = test::TestRequest::post()
        .uri("/auth/signin")
        .set_json(json!({ "username": username, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "sign-in for {} failed", username);
    let body: AuthResponse = test::read_body_json(resp).await;
    body.access_token
}

pub async fn create_task<S, B>(app: &S, token: &str, title: &str, description: &str) -> Task
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(token))
        .set_json(json!({ "title": title, "description": description }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    test::read_body_json(resp).await
}
