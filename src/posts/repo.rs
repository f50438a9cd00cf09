use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::posts::repo_types::{Post, PostContent, PostFilter};

const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.body, p.tags, p.image_link, \
                            p.image_owner, p.image_source, p.privacy, p.created_at, p.updated_at";

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Non-private posts matching the filter, ordered by title.
    async fn list_public(&self, filter: PostFilter) -> anyhow::Result<Vec<Post>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    /// Case-insensitive title lookup.
    async fn find_by_title(&self, title: &str) -> anyhow::Result<Option<Post>>;
    async fn insert(&self, author_id: Uuid, content: PostContent) -> anyhow::Result<Post>;
    async fn update(&self, id: Uuid, content: PostContent) -> anyhow::Result<Option<Post>>;
    async fn set_privacy(&self, id: Uuid, privacy: bool) -> anyhow::Result<Option<Post>>;
    /// Removes the post with its comments and category links.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Idempotent.
    async fn attach_category(&self, post_id: Uuid, category_id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list_public(&self, filter: PostFilter) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
              FROM posts p
             WHERE p.privacy = FALSE
               AND ($1::uuid IS NULL OR EXISTS (
                       SELECT 1 FROM post_categories pc
                        WHERE pc.post_id = p.id AND pc.category_id = $1))
               AND ($2::text IS NULL OR $2 = ANY(p.tags))
             ORDER BY lower(p.title) ASC
            "#
        ))
        .bind(filter.category_id)
        .bind(filter.tag)
        .fetch_all(&self.db)
        .await
        .context("list posts")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find post by id")?;
        Ok(row)
    }

    async fn find_by_title(&self, title: &str) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE lower(p.title) = lower($1)"
        ))
        .bind(title)
        .fetch_optional(&self.db)
        .await
        .context("find post by title")?;
        Ok(row)
    }

    async fn insert(&self, author_id: Uuid, content: PostContent) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts AS p
                   (author_id, title, body, tags, image_link, image_owner, image_source, privacy)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(author_id)
        .bind(content.title)
        .bind(content.body)
        .bind(content.tags)
        .bind(content.image_link)
        .bind(content.image_owner)
        .bind(content.image_source)
        .bind(content.privacy)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, content: PostContent) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts AS p
               SET title = $2, body = $3, tags = $4, image_link = $5,
                   image_owner = $6, image_source = $7, privacy = $8,
                   updated_at = now()
             WHERE p.id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(content.title)
        .bind(content.body)
        .bind(content.tags)
        .bind(content.image_link)
        .bind(content.image_owner)
        .bind(content.image_source)
        .bind(content.privacy)
        .fetch_optional(&self.db)
        .await
        .context("update post")?;
        Ok(row)
    }

    async fn set_privacy(&self, id: Uuid, privacy: bool) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts AS p
               SET privacy = $2, updated_at = now()
             WHERE p.id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(privacy)
        .fetch_optional(&self.db)
        .await
        .context("set post privacy")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }

    async fn attach_category(&self, post_id: Uuid, category_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_categories (post_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(category_id)
        .execute(&self.db)
        .await
        .context("attach category to post")?;
        Ok(())
    }
}
