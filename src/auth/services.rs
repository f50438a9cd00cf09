use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{SignupRequest, UpdateProfileRequest},
        password::Hasher,
        repo::UserStore,
        repo_types::{NewUser, ProfileUpdate, User},
    },
    error::{AppError, FieldErrors},
};

/// Outcome of a failed credential check. Rejections are kept apart from
/// store or hashing failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email")]
    IncorrectEmail,
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Resolves an email/password pair to the stored user.
pub async fn authenticate(
    users: &dyn UserStore,
    hasher: &Hasher,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = match users.find_by_email(email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::IncorrectEmail);
        }
    };

    let ok = hasher
        .verify_blocking(password.to_owned(), user.password_hash.clone())
        .await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::IncorrectPassword);
    }

    debug!(user_id = %user.id, "credentials accepted");
    Ok(user)
}

const SIGNUP_INVALID: &str = "Failed to meet the constraints for creating the user.";

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    let mut errs = FieldErrors::new();
    errs.length("Email", &req.email, 5, 30);
    errs.check(is_valid_email(&req.email), "Not a valid e-mail address");
    errs.length("Username", &req.username, 5, 30);
    errs.length("First name", &req.first_name, 1, 30);
    errs.length("Last name", &req.last_name, 3, 30);
    errs.length("Password", &req.password, 8, 30);
    errs.check(req.password == req.confirm_password, "Passwords don't match");
    errs.into_result(SIGNUP_INVALID)
}

/// Creates a user after validating the request and checking that the email
/// is not taken (ignoring case).
pub async fn signup(
    users: &dyn UserStore,
    hasher: &Hasher,
    mut req: SignupRequest,
) -> Result<User, AppError> {
    req.email = req.email.trim().to_string();
    req.username = req.username.trim().to_string();
    req.first_name = req.first_name.trim().to_string();
    req.last_name = req.last_name.trim().to_string();

    validate_signup(&req)?;

    if users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict(
            "User with that email already exists.".into(),
        ));
    }

    let password_hash = hasher.hash_blocking(req.password).await?;
    let user = users
        .insert(NewUser {
            email: req.email,
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn update_profile(
    users: &dyn UserStore,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<User, AppError> {
    let changes = ProfileUpdate {
        username: req.username.map(|s| s.trim().to_string()),
        first_name: req.first_name.map(|s| s.trim().to_string()),
        last_name: req.last_name.map(|s| s.trim().to_string()),
    };

    let mut errs = FieldErrors::new();
    if let Some(v) = &changes.username {
        errs.length("Username", v, 5, 30);
    }
    if let Some(v) = &changes.first_name {
        errs.length("First name", v, 1, 30);
    }
    if let Some(v) = &changes.last_name {
        errs.length("Last name", v, 3, 30);
    }
    errs.into_result("Failed to update the account.")?;

    users
        .update_profile(user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))
}
