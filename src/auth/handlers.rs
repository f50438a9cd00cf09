use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        claims::{Subject, TokenScope},
        dto::{LoginRequest, LoginResponse, PublicUser, SignupRequest, SignupResponse, UpdateProfileRequest},
        extractors::AuthUser,
        services,
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/user/login", post(login))
        .route("/user/signup", post(signup))
}

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/user/account", get(get_account).put(update_account))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let user = services::signup(state.users.as_ref(), &state.hasher, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Successfully created the user.".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation(
            "Email and password are required.",
            Vec::new(),
        ));
    }

    let user =
        services::authenticate(state.users.as_ref(), &state.hasher, email, &payload.password)
            .await?;

    let scope = TokenScope::for_user(&user);
    let token = state.keys.issue_for_scope(Subject::from(&user), scope)?;

    info!(user_id = %user.id, scope = ?scope, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all, fields(user_id = %claims.id))]
pub async fn get_account(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(user_id = %claims.id))]
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_profile(state.users.as_ref(), claims.id, payload).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}
