// src/classes.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;
use log::info;
use mongodb::bson::doc;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::{caller_id, load_profile, AuthSession};
use crate::errors::ApiError;
use crate::models::{ClassRecord, Role, Schedule, UserProfile};
use crate::roster::{sort_roster, RosterEntry};

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub subject: String,
    pub department: String,
    pub year: String,
    pub semester: String,
    pub section: String,
    pub schedule: Option<Schedule>,
}

/// CREATE a class. Teacher only; the caller becomes the owning teacher.
pub async fn create_class(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateClassRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;
    let session = AuthSession::from_profile(&profile);
    if session.role != Role::Teacher {
        return Err(ApiError::Permission(
            "only teachers can create classes".to_string(),
        ));
    }

    let payload = payload.into_inner();
    let new_class = ClassRecord {
        class_id: Uuid::new_v4().to_string(),
        name: payload.name,
        subject: payload.subject,
        department: payload.department,
        year: payload.year,
        semester: payload.semester,
        section: payload.section,
        teacher_id: session.user_id.clone(),
        schedule: payload.schedule,
        students: vec![],
        created_at: Utc::now(),
    };

    let classes = data.mongodb.db.collection::<ClassRecord>("classes");
    classes.insert_one(&new_class).await?;
    info!("class created: {} by {}", new_class.class_id, session.user_id);
    Ok(HttpResponse::Ok().json(&new_class))
}

/// LIST classes visible to the caller: a teacher sees the classes they own,
/// a student the classes they are enrolled in.
pub async fn list_classes(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;

    let filter = match profile.role {
        Role::Teacher => doc! { "teacher_id": &user_id },
        // Array-equality filter matches documents whose students list
        // contains the id.
        Role::Student => doc! { "students": &user_id },
    };

    let classes = data.mongodb.db.collection::<ClassRecord>("classes");
    let mut cursor = classes.find(filter).await?;
    let mut results: Vec<ClassRecord> = Vec::new();
    while let Some(class) = cursor.next().await {
        results.push(class?);
    }
    Ok(HttpResponse::Ok().json(results))
}

pub async fn load_class(db: &mongodb::Database, class_id: &str) -> Result<ClassRecord, ApiError> {
    db.collection::<ClassRecord>("classes")
        .find_one(doc! { "class_id": class_id })
        .await?
        .ok_or(ApiError::NotFound("class"))
}

/// GET a single class.
pub async fn get_class(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    caller_id(&req)?;
    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(class))
}

/// GET the class roster, sorted by roll number (numeric ascending,
/// non-numeric entries last).
pub async fn get_roster(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    caller_id(&req)?;
    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;

    let mut entries: Vec<RosterEntry> = Vec::new();
    if !class.students.is_empty() {
        let users = data.mongodb.db.collection::<UserProfile>("users");
        let mut cursor = users
            .find(doc! { "user_id": { "$in": &class.students } })
            .await?;
        while let Some(user) = cursor.next().await {
            let user = user?;
            entries.push(RosterEntry {
                user_id: user.user_id,
                full_name: user.full_name,
                roll_no: user.roll_no,
            });
        }
    }
    sort_roster(&mut entries);
    Ok(HttpResponse::Ok().json(entries))
}
