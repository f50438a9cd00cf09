use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub likes: i32,
    pub hidden: bool,
    pub created_at: OffsetDateTime,
}

/// Deleting a comment only hides it; hidden comments are excluded from every
/// lookup except `find_by_id`.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn list_visible(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn find_by_content(&self, post_id: Uuid, content: &str)
        -> anyhow::Result<Option<Comment>>;
    async fn insert(&self, post_id: Uuid, user_id: Uuid, content: &str)
        -> anyhow::Result<Comment>;
    async fn like(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn hide(&self, id: Uuid) -> anyhow::Result<bool>;
}

const COMMENT_COLUMNS: &str = "id, post_id, user_id, content, likes, hidden, created_at";

#[derive(Clone)]
pub struct PgCommentStore {
    db: PgPool,
}

impl PgCommentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn list_visible(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
              FROM comments
             WHERE post_id = $1 AND hidden = FALSE
             ORDER BY created_at ASC
            "#
        ))
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .context("list comments")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find comment by id")?;
        Ok(row)
    }

    async fn find_by_content(
        &self,
        post_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
              FROM comments
             WHERE post_id = $1 AND hidden = FALSE AND lower(content) = lower($2)
             LIMIT 1
            "#
        ))
        .bind(post_id)
        .bind(content)
        .fetch_optional(&self.db)
        .await
        .context("find comment by content")?;
        Ok(row)
    }

    async fn insert(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (post_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(row)
    }

    async fn like(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
               SET likes = likes + 1
             WHERE id = $1 AND hidden = FALSE
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("like comment")?;
        Ok(row)
    }

    async fn hide(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE comments SET hidden = TRUE WHERE id = $1 AND hidden = FALSE")
            .bind(id)
            .execute(&self.db)
            .await
            .context("hide comment")?;
        Ok(res.rows_affected() > 0)
    }
}
