use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{AppJson, AppPath},
    posts::{
        dto::{AttachCategoryRequest, MessageResponse, PostRequest, PostView, PrivacyRequest},
        repo_types::PostFilter,
        services,
    },
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
        .route("/posts/category/:id", get(list_by_category))
        .route("/posts/tag/:name", get(list_by_tag))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/:id", put(update_post).delete(delete_post))
        .route("/posts/:id/privacy", put(set_privacy))
        .route("/posts/:id/category", post(attach_category))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostView>>, AppError> {
    let posts = state.posts.list_public(PostFilter::default()).await?;
    Ok(Json(services::views(&state, posts).await?))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<PostView>, AppError> {
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(services::not_found)?;
    Ok(Json(services::view(&state, post).await?))
}

#[instrument(skip(state))]
pub async fn list_by_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Vec<PostView>>, AppError> {
    if state.categories.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Category not found.".into()));
    }
    let filter = PostFilter {
        category_id: Some(id),
        ..Default::default()
    };
    let posts = state.posts.list_public(filter).await?;
    Ok(Json(services::views(&state, posts).await?))
}

#[instrument(skip(state))]
pub async fn list_by_tag(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Json<Vec<PostView>>, AppError> {
    let filter = PostFilter {
        tag: Some(name),
        ..Default::default()
    };
    let posts = state.posts.list_public(filter).await?;
    Ok(Json(services::views(&state, posts).await?))
}

#[instrument(skip_all, fields(user_id = %claims.id))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(payload): AppJson<PostRequest>,
) -> Result<(StatusCode, Json<PostView>), AppError> {
    let post = services::create(&state, &claims, payload).await?;
    Ok((StatusCode::CREATED, Json(services::view(&state, post).await?)))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<PostRequest>,
) -> Result<Json<PostView>, AppError> {
    let post = services::update(&state, &claims, id, payload).await?;
    Ok(Json(services::view(&state, post).await?))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id))]
pub async fn set_privacy(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<PrivacyRequest>,
) -> Result<Json<PostView>, AppError> {
    let post = services::set_privacy(&state, &claims, id, payload.privacy).await?;
    Ok(Json(services::view(&state, post).await?))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete(&state, &claims, id).await?;
    Ok(Json(MessageResponse {
        message: "Post has been deleted.".into(),
    }))
}

#[instrument(skip_all, fields(user_id = %claims.id, post_id = %id))]
pub async fn attach_category(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AttachCategoryRequest>,
) -> Result<Json<PostView>, AppError> {
    let post = services::attach_category(&state, &claims, id, &payload.category).await?;
    Ok(Json(services::view(&state, post).await?))
}
