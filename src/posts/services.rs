use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{claims::Claims, dto::UserSummary},
    categories::services as categories,
    error::{AppError, FieldErrors},
    posts::{
        dto::{CommentView, PostRequest, PostView},
        repo_types::{Post, PostContent},
    },
    state::AppState,
};

const POST_INVALID: &str = "Failed to save the post, the constraints are not met.";

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Post not found.".into())
}

/// Trims and validates a post body; tags are de-duplicated keeping order.
/// `privacy` applies when the request does not set it.
pub fn validate(req: PostRequest, privacy: bool) -> Result<PostContent, AppError> {
    let mut tags: Vec<String> = Vec::with_capacity(req.tags.len());
    for tag in req.tags.iter().map(|t| t.trim().to_string()) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    let content = PostContent {
        title: req.title.trim().to_string(),
        body: req.body.trim().to_string(),
        tags,
        image_link: req.image_link.trim().to_string(),
        image_owner: req.image_owner.trim().to_string(),
        image_source: req.image_source.trim().to_string(),
        privacy: req.privacy.unwrap_or(privacy),
    };

    let mut errs = FieldErrors::new();
    errs.length("Title", &content.title, 5, 80);
    errs.length("Body", &content.body, 5, 50_000);
    for tag in &content.tags {
        errs.length("Tags", tag, 3, 30);
    }
    errs.check(!content.image_link.is_empty(), "Image_Link is required.");
    errs.length("Image_Owner", &content.image_owner, 3, 30);
    errs.length("Image_Source", &content.image_source, 3, 30);
    errs.into_result(POST_INVALID)?;
    Ok(content)
}

async fn summary(
    st: &AppState,
    cache: &mut HashMap<Uuid, Option<UserSummary>>,
    user_id: Uuid,
) -> Result<Option<UserSummary>, AppError> {
    if let Some(hit) = cache.get(&user_id) {
        return Ok(hit.clone());
    }
    let found = st.users.find_by_id(user_id).await?.as_ref().map(UserSummary::from);
    cache.insert(user_id, found.clone());
    Ok(found)
}

async fn view_with(
    st: &AppState,
    cache: &mut HashMap<Uuid, Option<UserSummary>>,
    post: Post,
) -> Result<PostView, AppError> {
    let author = summary(st, cache, post.author_id).await?;
    let categories = st.categories.list_for_post(post.id).await?;
    let mut comments = Vec::new();
    for c in st.comments.list_visible(post.id).await? {
        let user = summary(st, cache, c.user_id).await?;
        comments.push(CommentView {
            id: c.id,
            content: c.content,
            likes: c.likes,
            created_at: c.created_at,
            user,
        });
    }
    Ok(PostView {
        id: post.id,
        title: post.title,
        body: post.body,
        tags: post.tags,
        image_link: post.image_link,
        image_owner: post.image_owner,
        image_source: post.image_source,
        privacy: post.privacy,
        created_at: post.created_at,
        updated_at: post.updated_at,
        author,
        categories,
        comments,
    })
}

pub async fn view(st: &AppState, post: Post) -> Result<PostView, AppError> {
    view_with(st, &mut HashMap::new(), post).await
}

pub async fn views(st: &AppState, posts: Vec<Post>) -> Result<Vec<PostView>, AppError> {
    let mut cache = HashMap::new();
    let mut out = Vec::with_capacity(posts.len());
    for post in posts {
        out.push(view_with(st, &mut cache, post).await?);
    }
    Ok(out)
}

/// Loads a post the caller may modify: 404 if absent, 403 unless author or admin.
pub(crate) async fn load_owned(st: &AppState, claims: &Claims, id: Uuid) -> Result<Post, AppError> {
    let post = st.posts.find_by_id(id).await?.ok_or_else(not_found)?;
    if !claims.may_modify(post.author_id) {
        warn!(user_id = %claims.id, post_id = %id, "post modification refused");
        return Err(AppError::Forbidden(
            "Only the author or an administrator can change this post.".into(),
        ));
    }
    Ok(post)
}

async fn ensure_title_free(
    st: &AppState,
    title: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    match st.posts.find_by_title(title).await? {
        Some(existing) if Some(existing.id) != except => Err(AppError::Conflict(
            "Post already exists with that title.".into(),
        )),
        _ => Ok(()),
    }
}

pub async fn create(st: &AppState, claims: &Claims, req: PostRequest) -> Result<Post, AppError> {
    let content = validate(req, false)?;
    ensure_title_free(st, &content.title, None).await?;
    let post = st.posts.insert(claims.id, content).await?;
    info!(post_id = %post.id, author_id = %post.author_id, "post created");
    Ok(post)
}

pub async fn update(
    st: &AppState,
    claims: &Claims,
    id: Uuid,
    req: PostRequest,
) -> Result<Post, AppError> {
    let current = load_owned(st, claims, id).await?;
    let content = validate(req, current.privacy)?;
    ensure_title_free(st, &content.title, Some(id)).await?;
    let post = st.posts.update(id, content).await?.ok_or_else(not_found)?;
    info!(post_id = %post.id, "post updated");
    Ok(post)
}

pub async fn set_privacy(
    st: &AppState,
    claims: &Claims,
    id: Uuid,
    privacy: bool,
) -> Result<Post, AppError> {
    load_owned(st, claims, id).await?;
    let post = st
        .posts
        .set_privacy(id, privacy)
        .await?
        .ok_or_else(not_found)?;
    info!(post_id = %post.id, privacy, "post privacy changed");
    Ok(post)
}

pub async fn delete(st: &AppState, claims: &Claims, id: Uuid) -> Result<(), AppError> {
    load_owned(st, claims, id).await?;
    if !st.posts.delete(id).await? {
        return Err(not_found());
    }
    info!(post_id = %id, user_id = %claims.id, "post deleted");
    Ok(())
}

/// Links an existing category (matched ignoring case) or a freshly created one.
pub async fn attach_category(
    st: &AppState,
    claims: &Claims,
    id: Uuid,
    name: &str,
) -> Result<Post, AppError> {
    let post = load_owned(st, claims, id).await?;
    let category = categories::find_or_create(st.categories.as_ref(), name).await?;
    st.posts.attach_category(post.id, category.id).await?;
    info!(post_id = %post.id, category_id = %category.id, "category attached");
    Ok(post)
}
