use serde::Serialize;

use crate::db::DbPool;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Committee {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Create a committee. Returns `None` when the name is taken.
pub async fn create(
    pool: &DbPool,
    name: &str,
    description: Option<&str>,
) -> Result<Option<i64>, AppError> {
    let result = sqlx::query(
        "INSERT INTO committees (name, description) VALUES (?, ?) ON CONFLICT (name) DO NOTHING",
    )
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Committee>, AppError> {
    let committee = sqlx::query_as::<_, Committee>(
        "SELECT id, name, description FROM committees WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(committee)
}

pub async fn find_all(pool: &DbPool) -> Result<Vec<Committee>, AppError> {
    let committees = sqlx::query_as::<_, Committee>(
        "SELECT id, name, description FROM committees ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(committees)
}
