use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use staya_core::identity::{CredentialError, ProfileUpdate, RegisterRequest, RegistrationError};
use staya_core::{PublicProfile, User};
use staya_shared::pii::{mask_email, mask_phone, Masked};

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::middleware::{verify_token, Principal};
use crate::response::Envelope;
use crate::state::AppState;
use crate::token;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/updatedetails", put(update_details))
        .route("/updatepassword", put(update_password))
        .route_layer(from_fn_with_state(state, verify_token));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword", put(reset_password))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<Masked<String>>,
}

#[derive(Debug, Deserialize)]
struct ForgotPasswordRequest {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest {
    email: String,
    reset_code: String,
    password: Masked<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePasswordRequest {
    current_password: Masked<String>,
    new_password: Masked<String>,
}

/// Argon2 is CPU-bound; run it on the blocking pool instead of an async worker.
async fn off_thread<T, E>(work: impl FnOnce() -> Result<T, E> + Send + 'static) -> Result<T, AppError>
where
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
        .map_err(Into::into)
}

fn signed_in(state: &AppState, user: &User, status: axum::http::StatusCode) -> Result<Envelope<PublicProfile>, AppError> {
    let token = token::issue(&state.auth, user)?;
    Ok(Envelope::ok(user.profile()).with_token(token).with_status(status))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Envelope<PublicProfile>, AppError> {
    if state
        .users
        .find_by_email_or_phone(&request.email, &request.phone)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "User already exists with this email or phone number".to_string(),
        ));
    }

    let user = off_thread(move || User::register(request, Utc::now())).await?;
    // A concurrent sign-up can still win the race; the store's unique keys catch it.
    state.users.create_user(&user).await?;

    tracing::info!(
        "Registered {} account for {} / {}",
        user.role,
        mask_email(&user.email),
        mask_phone(&user.phone)
    );
    signed_in(&state, &user, axum::http::StatusCode::CREATED)
}

async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Envelope<PublicProfile>, AppError> {
    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.expose().is_empty() => {
            (email, password)
        }
        _ => return Err(AppError::BadRequest("Please provide an email and password".to_string())),
    };

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;
    let (user, matches) = off_thread(move || {
        let matches = user.check_password(&password)?;
        Ok::<_, CredentialError>((user, matches))
    })
    .await?;
    if !matches {
        tracing::debug!("Rejected login for {}", mask_email(&user.email));
        return Err(invalid());
    }

    signed_in(&state, &user, axum::http::StatusCode::OK)
}

async fn me(Principal { user }: Principal) -> Envelope<User> {
    Envelope::ok(user)
}

async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ForgotPasswordRequest>,
) -> Result<Envelope<Value>, AppError> {
    let email = request
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Please provide an email".to_string()))?;

    let mut user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let code = user.issue_reset_code(Utc::now());
    state.users.update_user(&user).await?;
    tracing::info!("Issued password reset code for {}", mask_email(&user.email));

    // No notification channel is wired up, so the code goes back to the caller.
    Ok(Envelope::ok(json!({ "resetCode": code })).with_message("Password reset code sent"))
}

async fn reset_password(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ResetPasswordRequest>,
) -> Result<Envelope<PublicProfile>, AppError> {
    let now = Utc::now();
    let invalid = || AppError::BadRequest("Invalid or expired reset code".to_string());

    let mut user = state.users.find_by_email(&request.email).await?.ok_or_else(invalid)?;
    if !user.reset_code_matches(&request.reset_code, now) {
        return Err(invalid());
    }

    let password = request.password;
    let user = off_thread(move || {
        user.set_password(&password, now)?;
        Ok::<_, RegistrationError>(user)
    })
    .await?;
    state.users.update_user(&user).await?;
    signed_in(&state, &user, axum::http::StatusCode::OK)
}

async fn update_details(
    State(state): State<AppState>,
    Principal { mut user }: Principal,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Envelope<PublicProfile>, AppError> {
    user.apply_profile(update, Utc::now())?;
    state.users.update_user(&user).await?;
    tracing::info!("Updated details for {} / {}", mask_email(&user.email), mask_phone(&user.phone));
    Ok(Envelope::ok(user.profile()))
}

async fn update_password(
    State(state): State<AppState>,
    Principal { user }: Principal,
    JsonBody(request): JsonBody<UpdatePasswordRequest>,
) -> Result<Envelope<PublicProfile>, AppError> {
    let (mut user, matches) = off_thread(move || {
        let matches = user.check_password(&request.current_password)?;
        Ok::<_, CredentialError>((user, matches))
    })
    .await?;
    if !matches {
        return Err(AppError::Unauthorized("Password is incorrect".to_string()));
    }

    let password = request.new_password;
    let user = off_thread(move || {
        user.set_password(&password, Utc::now())?;
        Ok::<_, RegistrationError>(user)
    })
    .await?;
    state.users.update_user(&user).await?;
    signed_in(&state, &user, axum::http::StatusCode::OK)
}
