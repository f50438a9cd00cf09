use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    comments::{repo::Comment, services},
    error::AppError,
    extract::{AppJson, AppPath},
    posts::{
        dto::{MessageResponse, PostView},
        services as posts,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts/:id/comments", post(add_comment))
        .route("/posts/:id/comments/:comment_id/like", post(like_comment))
        .route("/posts/:id/comments/:comment_id", delete(delete_comment))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<(StatusCode, Json<PostView>), AppError> {
    let post = services::add(&state, &claims, id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(posts::view(&state, post).await?)))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id, comment_id = %comment_id))]
pub async fn like_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath((id, comment_id)): AppPath<(Uuid, Uuid)>,
) -> Result<Json<Comment>, AppError> {
    Ok(Json(services::like(&state, id, comment_id).await?))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id, comment_id = %comment_id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath((id, comment_id)): AppPath<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    services::hide(&state, &claims, id, comment_id).await?;
    Ok(Json(MessageResponse {
        message: "Comment has been deleted.".into(),
    }))
}
