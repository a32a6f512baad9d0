// src/users.rs

use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::{caller_id, load_profile};
use crate::errors::ApiError;
use crate::models::{Role, UserProfile};

/// Profile fields safe to return to clients (never the password hash).
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user_id: String,
    pub full_name: String,
    pub roll_no: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub class_id: Option<String>,
}

impl From<UserProfile> for ProfileView {
    fn from(user: UserProfile) -> Self {
        ProfileView {
            user_id: user.user_id,
            full_name: user.full_name,
            roll_no: user.roll_no,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            class_id: user.class_id,
        }
    }
}

pub async fn get_me(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;
    Ok(HttpResponse::Ok().json(ProfileView::from(profile)))
}

#[derive(Debug, Deserialize)]
pub struct FindUserQuery {
    pub query: String,
}

pub async fn find_user_email(
    req: HttpRequest,
    query: web::Query<FindUserQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    caller_id(&req)?;
    let users = data.mongodb.db.collection::<UserProfile>("users");
    let filter = doc! { "email": { "$regex": &query.query, "$options": "i" } };

    let mut cursor = users.find(filter).await?;
    let mut results: Vec<ProfileView> = Vec::new();
    while let Some(user) = cursor.next().await {
        results.push(ProfileView::from(user?));
    }
    Ok(HttpResponse::Ok().json(results))
}
