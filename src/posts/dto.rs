use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{auth::dto::UserSummary, categories::repo::Category};

/// Body of create and full-update requests. An absent `privacy` means public
/// on create and leaves the stored value alone on update.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_link: String,
    pub image_owner: String,
    pub image_source: String,
    #[serde(default)]
    pub privacy: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PrivacyRequest {
    pub privacy: bool,
}

#[derive(Debug, Deserialize)]
pub struct AttachCategoryRequest {
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub likes: i32,
    pub created_at: OffsetDateTime,
    pub user: Option<UserSummary>,
}

/// A post with its author, categories and visible comments resolved.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub image_link: String,
    pub image_owner: String,
    pub image_source: String,
    pub privacy: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author: Option<UserSummary>,
    pub categories: Vec<Category>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
