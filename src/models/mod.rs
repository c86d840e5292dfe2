pub mod task;
pub mod user;

pub use task::{StatusUpdate, Task, TaskFilter, TaskInput, TaskQuery, TaskStatus};
pub use user::{NewUser, User, UserFilter, UserFilterQuery, UserProfile};
