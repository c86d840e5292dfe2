#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "A task-management REST API: users sign up and sign in for a bearer token, then"]
#![doc = "create, filter and update their own tasks. Creating a task hands a delayed job to"]
#![doc = "a queue, which a background worker consumes. The binary (`main.rs`) wires the"]
#![doc = "pieces defined here into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
