use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// Category names are unique ignoring case.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Category>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>>;
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Category>>;
    async fn insert(&self, name: &str) -> anyhow::Result<Category>;
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Category>>;
}

#[derive(Clone)]
pub struct PgCategoryStore {
    db: PgPool,
}

impl PgCategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY lower(name) ASC",
        )
        .fetch_all(&self.db)
        .await
        .context("list categories")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find category by id")?;
        Ok(row)
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories WHERE lower(name) = lower($1)",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .context("find category by name")?;
        Ok(row)
    }

    async fn insert(&self, name: &str) -> anyhow::Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.db)
        .await
        .context("insert category")?;
        Ok(row)
    }

    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.created_at
              FROM categories c
              JOIN post_categories pc ON pc.category_id = c.id
             WHERE pc.post_id = $1
             ORDER BY lower(c.name) ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .context("list categories for post")?;
        Ok(rows)
    }
}
