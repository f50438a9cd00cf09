use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub image_link: String,
    pub image_owner: String,
    pub image_source: String,
    pub privacy: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Editable content of a post, already validated and trimmed.
#[derive(Debug, Clone)]
pub struct PostContent {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub image_link: String,
    pub image_owner: String,
    pub image_source: String,
    pub privacy: bool,
}

/// Narrows public listings. Empty filter lists every public post.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category_id: Option<Uuid>,
    pub tag: Option<String>,
}
