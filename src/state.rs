use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::Hasher,
        repo::{PgUserStore, UserStore},
    },
    categories::repo::{CategoryStore, PgCategoryStore},
    comments::repo::{CommentStore, PgCommentStore},
    config::AppConfig,
    posts::repo::{PgPostStore, PostStore},
};

/// Shared, read-only handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<JwtKeys>,
    pub hasher: Hasher,
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
}

impl AppState {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;
        Ok(db)
    }

    pub fn from_pool(config: &AppConfig, db: PgPool) -> anyhow::Result<Self> {
        Ok(Self {
            keys: Arc::new(JwtKeys::new(&config.jwt)),
            hasher: Hasher::new(&config.password)?,
            users: Arc::new(PgUserStore::new(db.clone())),
            categories: Arc::new(PgCategoryStore::new(db.clone())),
            posts: Arc::new(PgPostStore::new(db.clone())),
            comments: Arc::new(PgCommentStore::new(db)),
        })
    }

    /// State backed by one in-memory store, with fast hashing.
    #[cfg(test)]
    pub fn fake() -> (Self, Arc<crate::testing::MemoryStore>) {
        let store = Arc::new(crate::testing::MemoryStore::new());
        let state = Self {
            keys: Arc::new(JwtKeys::new(&crate::auth::jwt::test_config())),
            hasher: crate::auth::password::fast_hasher(),
            users: store.clone(),
            categories: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
        };
        (state, store)
    }
}
