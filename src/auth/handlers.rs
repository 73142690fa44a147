use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, CreateAccountRequest, CreatedResponse, ForgotPasswordRequest,
            ForgotPasswordResponse, LoginRequest, MessageResponse, RefreshRequest,
            ResetPasswordRequest, SignupRequest,
        },
        repo::{NewUser, User},
        role::Role,
        services::{
            check_password_policy, generate_reset_token, hash_password, is_valid_email,
            require_admin, reset_token_expiry, verify_password, AuthUser, JwtKeys,
        },
    },
    error::ApiError,
    state::AppState,
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/create-account", post(create_account))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// A required field counts as present only when it holds something other
/// than whitespace.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Self-service signup. The stored role is always RETAIL_CUSTOMER no
/// matter what the payload carried.
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
        present(payload.email),
        present(payload.password),
        present(payload.first_name),
        present(payload.last_name),
    ) else {
        warn!("signup missing required fields");
        return Err(ApiError::Validation("Missing required fields".into()));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    check_password_policy(&password)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "signup email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&password)?;
    let user = User::create(
        &state.db,
        NewUser {
            email: &email,
            password_hash: &hash,
            first_name: &first_name,
            last_name: &last_name,
            role: Role::RetailCustomer,
            is_active: true,
            email_verified: false,
            phone: payload.profile.phone.as_deref(),
            address: payload.profile.address.as_deref(),
            city: payload.profile.city.as_deref(),
            state: payload.profile.state.as_deref(),
            zip_code: payload.profile.zip_code.as_deref(),
            country: payload.profile.country.as_deref(),
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "User created successfully".into(),
            user: user.into(),
        }),
    ))
}

/// Admin-initiated account creation, limited to EMPLOYEE and
/// RESELLER_CUSTOMER. The handler re-validates the caller's role rather
/// than trusting the transport.
#[instrument(skip(state, payload, claims))]
pub async fn create_account(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    require_admin(&claims)?;

    let (Some(email), Some(password), Some(first_name), Some(last_name), Some(role)) = (
        present(payload.email),
        present(payload.password),
        present(payload.first_name),
        present(payload.last_name),
        present(payload.role),
    ) else {
        warn!("create-account missing required fields");
        return Err(ApiError::Validation("Missing required fields".into()));
    };

    let role = role
        .parse::<Role>()
        .ok()
        .filter(|r| r.admin_assignable())
        .ok_or(ApiError::RoleNotAllowed)?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    check_password_policy(&password)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "create-account email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&password)?;
    let user = User::create(
        &state.db,
        NewUser {
            email: &email,
            password_hash: &hash,
            first_name: &first_name,
            last_name: &last_name,
            role,
            is_active: true,
            // Admin-created accounts are pre-verified.
            email_verified: true,
            phone: payload.profile.phone.as_deref(),
            address: payload.profile.address.as_deref(),
            city: payload.profile.city.as_deref(),
            state: payload.profile.state.as_deref(),
            zip_code: payload.profile.zip_code.as_deref(),
            country: payload.profile.country.as_deref(),
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, admin = %claims.sub, "account created by admin");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Account created successfully".into(),
            user: user.into(),
        }),
    ))
}

/// Unknown email and wrong password both answer with the same error.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user)?;
    let refresh_token = keys.sign_refresh(&user)?;
    let redirect_to = user.role.landing_route();

    info!(user_id = %user.id, role = ?user.role, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
        redirect_to,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::InvalidToken)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    // Issue new pair
    let access_token = keys.sign_access(&user)?;
    let refresh_token = keys.sign_refresh(&user)?;
    let redirect_to = user.role.landing_route();

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
        redirect_to,
    }))
}

/// Always answers 200 with the same message so callers cannot probe which
/// emails have accounts.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let Some(email) = present(payload.email) else {
        return Err(ApiError::Validation("Email is required".into()));
    };

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        debug!("password reset requested for unknown email");
        return Ok(Json(ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE.into(),
            reset_token: None,
        }));
    };

    let token = generate_reset_token();
    let expires = reset_token_expiry(OffsetDateTime::now_utc());
    User::set_reset_token(&state.db, user.id, &token, expires).await?;
    info!(user_id = %user.id, "password reset token issued");

    let reset_token = if state.config.expose_reset_token {
        debug!(user_id = %user.id, token = %token, "reset token exposed");
        Some(token)
    } else {
        None
    };

    Ok(Json(ForgotPasswordResponse {
        message: FORGOT_PASSWORD_MESSAGE.into(),
        reset_token,
    }))
}

/// Redeems a reset token exactly once. Unknown and expired tokens answer
/// with the same error.
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(token), Some(new_password)) =
        (present(payload.token), present(payload.new_password))
    else {
        return Err(ApiError::Validation(
            "Token and new password are required".into(),
        ));
    };
    check_password_policy(&new_password)?;

    let hash = hash_password(&new_password)?;
    let Some(user) =
        User::redeem_reset_token(&state.db, &token, &hash, OffsetDateTime::now_utc()).await?
    else {
        warn!("password reset with invalid or expired token");
        return Err(ApiError::InvalidOrExpiredToken);
    };

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse {
        message: "Password reset successfully".into(),
    }))
}

#[instrument(skip(state, claims))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<crate::auth::dto::PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::InvalidToken)?;
    Ok(Json(user.into()))
}
