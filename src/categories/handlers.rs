use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    categories::{repo::Category, services},
    error::AppError,
    extract::AppJson,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedCategoryResponse {
    pub message: String,
    pub category: Category,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/category", get(list_categories))
        .route("/category/create", post(create_category))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.categories.list().await?))
}

#[instrument(skip_all, fields(user_id = %claims.id))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CreatedCategoryResponse>), AppError> {
    if !claims.is_admin() {
        warn!(user_id = %claims.id, "non-admin tried to create a category");
        return Err(AppError::Forbidden(
            "Only administrators can create categories.".into(),
        ));
    }
    let category = services::create(state.categories.as_ref(), &payload.category).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedCategoryResponse {
            message: "Category has been created.".into(),
            category,
        }),
    ))
}
