//! PostgreSQL stores built on `sqlx`. The schema lives in `migrations/`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{NewUser, Task, TaskFilter, TaskStatus, User, UserFilter, UserProfile};

const UNIQUE_VIOLATION: &str = "23505";

const TASK_COLUMNS: &str = "id, title, description, status, user_id, created_at, updated_at";

/// Connects to `database_url` and applies pending migrations.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPool::connect(database_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, salt, is_partner, certified)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, username, password_hash, salt, is_partner, certified, created_at",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .bind(user.is_partner)
        .bind(user.certified)
        .fetch_one(&self.pool)
        .await;

        result.map_err(|err| {
            let duplicate = matches!(
                &err,
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
            );
            if duplicate {
                StoreError::Conflict("Username already exists".into())
            } else {
                StoreError::Database(err)
            }
        })
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, salt, is_partner, certified, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn filter(&self, filter: &UserFilter) -> StoreResult<Vec<UserProfile>> {
        // Conditions are appended in the same order the values are bound below.
        let mut sql = String::from("SELECT username, is_partner, certified FROM users WHERE TRUE");
        let mut param_count = 1;

        if filter.is_partner.is_some() {
            sql.push_str(&format!(" AND is_partner = ${}", param_count));
            param_count += 1;
        }
        if filter.certified.is_some() {
            sql.push_str(&format!(" AND certified = ${}", param_count));
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query_as::<_, UserProfile>(&sql);
        if let Some(is_partner) = filter.is_partner {
            query = query.bind(is_partner);
        }
        if let Some(certified) = filter.certified {
            query = query.bind(certified);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the owner-scoped listing query for `filter`.
///
/// `$1` is always the owner id. Search uses `strpos` so the text is matched
/// literally and case-sensitively; `%` and `_` carry no special meaning.
fn list_sql(filter: &TaskFilter) -> String {
    let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if filter.status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if filter.search.is_some() {
        sql.push_str(&format!(
            " AND (strpos(title, ${0}) > 0 OR strpos(description, ${0}) > 0)",
            param_count
        ));
    }

    sql.push_str(" ORDER BY created_at ASC");
    sql
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: &Task) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.user_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let sql = list_sql(filter);
        let mut query = sqlx::query_as::<_, Task>(&sql).bind(filter.owner_id);

        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(search) = &filter.search {
            query = query.bind(search);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid, owner_id: i32) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1 AND user_id = $2", TASK_COLUMNS);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn update_status(
        &self,
        id: Uuid,
        owner_id: i32,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET status = $1, updated_at = NOW()
             WHERE id = $2 AND user_id = $3
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(status)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid, owner_id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_sql_without_criteria() {
        let filter = TaskFilter {
            owner_id: 1,
            status: None,
            search: None,
        };
        assert_eq!(
            list_sql(&filter),
            "SELECT id, title, description, status, user_id, created_at, updated_at \
             FROM tasks WHERE user_id = $1 ORDER BY created_at ASC"
        );
    }

    #[test]
    fn test_list_sql_numbers_parameters_in_bind_order() {
        let filter = TaskFilter {
            owner_id: 1,
            status: Some(TaskStatus::Done),
            search: Some("hello".to_string()),
        };
        let sql = list_sql(&filter);
        assert!(sql.contains("WHERE user_id = $1 AND status = $2"));
        assert!(sql.contains("strpos(title, $3) > 0 OR strpos(description, $3) > 0"));

        let search_only = TaskFilter {
            owner_id: 1,
            status: None,
            search: Some("hello".to_string()),
        };
        assert!(list_sql(&search_only).contains("strpos(title, $2)"));
    }
}
