use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
        AuthUser,
    },
    error::{json_body, AppError},
    games::validation::Violations,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const MIN_DISPLAY_NAME_LEN: usize = 3;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: user.into(),
    })
}

/// Checks every registration field at once and returns the normalized request.
fn validate_register(body: &Value) -> Result<RegisterRequest, Violations> {
    let mut v = Violations::default();
    let Some(obj) = body.as_object() else {
        return Err(Violations::single("body", "must be a JSON object"));
    };
    let mut text = |field: &str| match obj.get(field) {
        None | Some(Value::Null) => {
            v.push(field, "is required");
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            v.push(field, "must be a string");
            None
        }
    };
    let email = text("email").map(|e| e.trim().to_lowercase());
    let password = text("password");
    let display_name = text("displayName").map(|d| d.trim().to_string());

    if let Some(email) = email.as_deref() {
        if !is_valid_email(email) {
            v.push("email", "must be a valid email address");
        }
    }
    if let Some(password) = password.as_deref() {
        if password.chars().count() < MIN_PASSWORD_LEN {
            v.push(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
    }
    if let Some(name) = display_name.as_deref() {
        if name.chars().count() < MIN_DISPLAY_NAME_LEN {
            v.push(
                "displayName",
                format!("must be at least {MIN_DISPLAY_NAME_LEN} characters"),
            );
        }
    }
    v.check()?;

    Ok(RegisterRequest {
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
        display_name: display_name.unwrap_or_default(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let body = json_body(payload)?;
    let RegisterRequest {
        email,
        password,
        display_name,
    } = validate_register(&body).map_err(|v| {
        warn!(fields = ?v.fields(), "registration rejected");
        AppError::from(v)
    })?;

    let password_hash = hash_password(&password)?;
    let user = state
        .users
        .create(NewUser {
            email,
            display_name,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let payload = json_body(payload)?;
    let email = payload.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(Violations::single("email", "must be a valid email address").into());
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthenticated("invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthenticated("invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let payload = json_body(payload)?;
    let keys = JwtKeys::from_ref(&state);
    let user_id = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthenticated("invalid or expired refresh token")
    })?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthenticated("user not found"))?;

    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthenticated("user not found"))?;
    Ok(Json(user.into()))
}
