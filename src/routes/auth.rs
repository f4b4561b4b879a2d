use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::get_config;
use crate::entities::user::{self, Entity as User};
use crate::error::AppError;
use crate::middleware::auth::Claims;

use super::AppState;

const TOKEN_TTL_SECS: usize = 24 * 60 * 60;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    id: Uuid,
    username: String,
    created_at: chrono::NaiveDateTime,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    access_token: String,
    expires_in: usize,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 409, description = "Username already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    println!("Auth | POST /auth/register | username={}", payload.username);

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(format!("Password hash error: {}", e)))?
        .to_string();

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(payload.username),
        password: Set(password_hash),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    match new_user.insert(&state.db).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(UserResponse {
                id: created.id,
                username: created.username,
                created_at: created.created_at,
            }),
        )),
        Err(e) if e.to_string().contains("duplicate key value violates unique constraint") => {
            Err(AppError::Conflict("Username already exists".to_string()))
        }
        Err(e) => Err(AppError::DatabaseError(e)),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let found = User::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ))?;

    let parsed_hash = PasswordHash::new(&found.password)
        .map_err(|e| AppError::InternalServerError(format!("Hash parse error: {}", e)))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let expiration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
        + TOKEN_TTL_SECS;

    let claims = Claims {
        sub: found.id.to_string(),
        exp: expiration,
    };
    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_config().jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encode error: {}", e)))?;

    println!("Auth | POST /auth/login | username={} | res=200", found.username);
    Ok(Json(LoginResponse {
        access_token,
        expires_in: TOKEN_TTL_SECS,
    }))
}
