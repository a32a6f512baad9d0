// src/auth.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::info;
use mongodb::bson::doc;
use mongodb::Database;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::models::{Role, UserProfile};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// The authenticated caller, passed explicitly into domain calls instead of
/// being read from ambient global state.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub role: Role,
}

impl AuthSession {
    pub fn from_profile(profile: &UserProfile) -> Self {
        AuthSession {
            user_id: profile.user_id.clone(),
            role: profile.role,
        }
    }
}

#[derive(Deserialize)]
pub struct SignupInfo {
    pub full_name: String,
    pub roll_no: String,
    pub email: String,
    pub password: String,
    /// Explicit role selection; roles are never inferred from the roll number.
    pub role: Role,
    pub phone_number: Option<String>,
    pub class_id: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginInfo {
    pub email: String,
    pub password: String,
}

// JWT Creation
pub fn create_jwt(user_id: &str, secret: &str) -> Result<String, ApiError> {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

/// User id stamped into request extensions by the `Authentication` middleware.
pub fn caller_id(req: &HttpRequest) -> Result<String, ApiError> {
    req.extensions()
        .get::<String>()
        .cloned()
        .ok_or(ApiError::Unauthorized)
}

pub async fn load_profile(db: &Database, user_id: &str) -> Result<UserProfile, ApiError> {
    db.collection::<UserProfile>("users")
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or(ApiError::NotFound("user"))
}

// Signup Endpoint
pub async fn signup(
    data: web::Data<AppState>,
    signup_info: web::Json<SignupInfo>,
) -> Result<HttpResponse, ApiError> {
    let info = signup_info.into_inner();
    if !info.email.contains('@') {
        return Err(ApiError::Validation("email looks invalid".to_string()));
    }
    if info.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }

    let users = data.mongodb.db.collection::<UserProfile>("users");
    if users
        .find_one(doc! { "email": &info.email })
        .await?
        .is_some()
    {
        return Err(ApiError::Validation("email already registered".to_string()));
    }

    let new_user = UserProfile {
        user_id: Uuid::new_v4().to_string(),
        full_name: info.full_name,
        roll_no: info.roll_no,
        email: info.email,
        phone_number: info.phone_number,
        role: info.role,
        class_id: info.class_id,
        hashed_password: hash(&info.password, DEFAULT_COST)?,
        created_at: Utc::now(),
    };
    users.insert_one(&new_user).await?;
    info!("user created: {} ({:?})", new_user.user_id, new_user.role);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "User created",
        "user_id": new_user.user_id,
        "role": new_user.role,
    })))
}

// Login Endpoint
pub async fn login(
    data: web::Data<AppState>,
    login_info: web::Json<LoginInfo>,
) -> Result<HttpResponse, ApiError> {
    let users = data.mongodb.db.collection::<UserProfile>("users");
    let user = users
        .find_one(doc! { "email": &login_info.email })
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify(&login_info.password, &user.hashed_password).unwrap_or(false) {
        return Err(ApiError::Unauthorized);
    }

    let token = create_jwt(&user.user_id, &data.config.jwt_secret)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "token": token,
        "user_id": user.user_id,
        "role": user.role,
    })))
}
