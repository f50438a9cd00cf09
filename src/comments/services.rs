use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::claims::Claims,
    comments::repo::Comment,
    error::{AppError, FieldErrors},
    posts::{repo_types::Post, services::not_found},
    state::AppState,
};

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found.".into())
}

async fn load_post(st: &AppState, post_id: Uuid) -> Result<Post, AppError> {
    st.posts.find_by_id(post_id).await?.ok_or_else(not_found)
}

/// A visible comment that belongs to `post_id`.
async fn load_comment(st: &AppState, post_id: Uuid, comment_id: Uuid) -> Result<Comment, AppError> {
    match st.comments.find_by_id(comment_id).await? {
        Some(c) if c.post_id == post_id && !c.hidden => Ok(c),
        _ => Err(comment_not_found()),
    }
}

pub async fn add(
    st: &AppState,
    claims: &Claims,
    post_id: Uuid,
    raw: &str,
) -> Result<Post, AppError> {
    let content = raw.trim();
    let mut errs = FieldErrors::new();
    errs.length("Content", content, 5, 100);
    errs.into_result("Failed to create a comment, the constraints are not met.")?;

    let post = load_post(st, post_id).await?;
    if st.comments.find_by_content(post_id, content).await?.is_some() {
        return Err(AppError::Conflict(
            "Comment with this content already exists.".into(),
        ));
    }
    let comment = st.comments.insert(post_id, claims.id, content).await?;
    info!(comment_id = %comment.id, post_id = %post_id, user_id = %claims.id, "comment added");
    Ok(post)
}

pub async fn like(
    st: &AppState,
    post_id: Uuid,
    comment_id: Uuid,
) -> Result<Comment, AppError> {
    load_comment(st, post_id, comment_id).await?;
    st.comments
        .like(comment_id)
        .await?
        .ok_or_else(comment_not_found)
}

/// Hides a comment. Allowed for the comment author, the post author and admins.
pub async fn hide(
    st: &AppState,
    claims: &Claims,
    post_id: Uuid,
    comment_id: Uuid,
) -> Result<(), AppError> {
    let post = load_post(st, post_id).await?;
    let comment = load_comment(st, post_id, comment_id).await?;
    if !(claims.may_modify(comment.user_id) || claims.id == post.author_id) {
        warn!(user_id = %claims.id, comment_id = %comment_id, "comment deletion refused");
        return Err(AppError::Forbidden(
            "Only the comment author, the post author or an administrator can delete this comment."
                .into(),
        ));
    }
    if !st.comments.hide(comment_id).await? {
        return Err(comment_not_found());
    }
    info!(comment_id = %comment_id, user_id = %claims.id, "comment hidden");
    Ok(())
}
