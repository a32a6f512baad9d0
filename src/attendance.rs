// src/attendance.rs
//
// Attendance session endpoints: the lifecycle controller wired to the store.
// Window rules live in `lifecycle`; this module owns the store round-trips
// and keeps presence mutations atomic ($addToSet / filtered $set) so
// concurrent marks never clobber each other.

use std::collections::HashSet;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::info;
use mongodb::bson::{doc, Document};
use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::{caller_id, load_profile, AuthSession};
use crate::classes::load_class;
use crate::codec;
use crate::errors::ApiError;
use crate::lifecycle::{self, SessionStatus};
use crate::models::{AttendanceSession, ClassRecord, Role};
use crate::roster::ensure_enrolled;
use crate::stats;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAttendanceRequest {
    pub present: Vec<String>,
}

/// Session plus window state as returned to clients. `remaining_seconds` is
/// display-only; the server re-checks the window on every mutation.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub remaining_seconds: i64,
    pub session: AttendanceSession,
}

impl SessionView {
    fn new(session: AttendanceSession, now: DateTime<Utc>) -> Self {
        SessionView {
            status: lifecycle::status(&session, now),
            remaining_seconds: lifecycle::remaining_seconds(&session, now),
            session,
        }
    }
}

fn attendance_coll(db: &Database) -> mongodb::Collection<Document> {
    db.collection::<Document>("attendance")
}

fn require_owner(class: &ClassRecord, session: &AuthSession) -> Result<(), ApiError> {
    if class.teacher_id != session.user_id {
        return Err(ApiError::Permission(
            "only the class teacher can manage attendance".to_string(),
        ));
    }
    Ok(())
}

async fn load_today_session(
    db: &Database,
    class_id: &str,
    now: DateTime<Utc>,
) -> Result<AttendanceSession, ApiError> {
    let key = codec::session_key(class_id, &now.format("%Y-%m-%d").to_string());
    let doc = attendance_coll(db)
        .find_one(doc! { "_id": &key })
        .await?
        .ok_or(ApiError::NoActiveSession)?;
    codec::decode(&doc)
}

/// START a session: open a fresh attendance window for today.
///
/// Overwrites any existing session for the same day — an explicit re-open
/// resets the window and discards the prior `present` list.
pub async fn start_session(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: Option<web::Json<StartSessionRequest>>,
) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;
    let auth = AuthSession::from_profile(&profile);

    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    require_owner(&class, &auth)?;

    let duration = payload
        .and_then(|p| p.duration_minutes)
        .unwrap_or(data.config.session_duration_minutes);
    if !(1..=180).contains(&duration) {
        return Err(ApiError::Validation(
            "duration_minutes must be between 1 and 180".to_string(),
        ));
    }

    let now = Utc::now();
    let session = lifecycle::open_window(&class.class_id, &auth.user_id, now, duration);
    let key = codec::session_key(&session.class_id, &session.date);
    attendance_coll(&data.mongodb.db)
        .replace_one(doc! { "_id": &key }, codec::encode(&session))
        .upsert(true)
        .await?;

    info!(
        "attendance session opened for class {} until {}",
        session.class_id,
        codec::timestamp(&session.end_time)
    );
    Ok(HttpResponse::Ok().json(SessionView::new(session, now)))
}

/// GET today's session with its window state and countdown. Clients poll this
/// instead of the server keeping any timer.
pub async fn today_session(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    caller_id(&req)?;
    let now = Utc::now();
    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    let session = load_today_session(&data.mongodb.db, &class.class_id, now).await?;
    Ok(HttpResponse::Ok().json(SessionView::new(session, now)))
}

/// Student self-mark. Auto-enrolls the student into the roster first, then
/// appends their id with a single `$addToSet` whose filter re-checks the
/// window, so a raced expiry or duplicate can never be written.
pub async fn mark_self_present(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;
    if profile.role != Role::Student {
        return Err(ApiError::Permission(
            "only students can mark themselves present".to_string(),
        ));
    }

    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    ensure_enrolled(&data.mongodb.db, &class, &profile).await?;

    let now = Utc::now();
    let mut session = load_today_session(&data.mongodb.db, &class.class_id, now).await?;
    // Window and duplicate preconditions live in the pure controller; the
    // mutated working copy is discarded in favor of the atomic write below.
    lifecycle::mark_present(&mut session, &profile.user_id, now)?;

    let key = codec::session_key(&session.class_id, &session.date);
    let result = attendance_coll(&data.mongodb.db)
        .update_one(
            doc! { "_id": &key, "end_time": { "$gte": codec::timestamp(&now) } },
            doc! { "$addToSet": { "present": &profile.user_id } },
        )
        .await?;
    // The filter re-checks expiry and $addToSet is a no-op on duplicates, so
    // a race lost between the read above and this write still errors cleanly.
    if result.matched_count == 0 {
        return Err(ApiError::SessionExpired);
    }
    if result.modified_count == 0 {
        return Err(ApiError::AlreadyMarked);
    }

    info!(
        "student {} marked present in class {}",
        profile.user_id, class.class_id
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "marked" })))
}

/// Deduplicate the staged list, preserving first-seen order. The save is an
/// unconditional replace, so every staged id is written as-is — ids not yet
/// on the roster included (they enroll through the reconciler on their next
/// self-mark).
fn staged_present(ids: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Teacher bulk save: replaces the stored `present` list with the staged one
/// in a single write. Last write wins; a student self-mark racing an older
/// staged copy is resolved by whichever write lands second.
pub async fn save_attendance(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<SaveAttendanceRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;
    let auth = AuthSession::from_profile(&profile);

    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    require_owner(&class, &auth)?;

    let now = Utc::now();
    let session = load_today_session(&data.mongodb.db, &class.class_id, now).await?;
    lifecycle::check_open(&session, now)?;

    let present = staged_present(payload.into_inner().present);

    let key = codec::session_key(&session.class_id, &session.date);
    let result = attendance_coll(&data.mongodb.db)
        .update_one(
            doc! { "_id": &key, "end_time": { "$gte": codec::timestamp(&now) } },
            doc! { "$set": { "present": &present } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::SessionExpired);
    }

    info!(
        "attendance saved for class {}: {} present",
        class.class_id,
        present.len()
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "saved",
        "present_count": present.len(),
    })))
}

async fn load_history(db: &Database, class_id: &str) -> Result<Vec<AttendanceSession>, ApiError> {
    let mut cursor = attendance_coll(db)
        .find(doc! { "class_id": class_id })
        .await?;
    let mut sessions: Vec<AttendanceSession> = Vec::new();
    while let Some(doc) = cursor.next().await {
        sessions.push(codec::decode(&doc?)?);
    }
    sessions.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(sessions)
}

/// GET all sessions for a class, oldest first.
pub async fn session_history(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    caller_id(&req)?;
    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    let sessions = load_history(&data.mongodb.db, &class.class_id).await?;
    Ok(HttpResponse::Ok().json(sessions))
}

/// GET class-level statistics (teacher only).
pub async fn class_stats(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;
    let auth = AuthSession::from_profile(&profile);

    let class = load_class(&data.mongodb.db, &path.into_inner()).await?;
    require_owner(&class, &auth)?;

    let sessions = load_history(&data.mongodb.db, &class.class_id).await?;
    Ok(HttpResponse::Ok().json(stats::class_stats(&sessions)))
}

/// GET one student's statistics. Allowed for the class teacher and for the
/// student asking about themselves.
pub async fn student_stats(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (class_id, student_id) = path.into_inner();
    let user_id = caller_id(&req)?;
    let profile = load_profile(&data.mongodb.db, &user_id).await?;

    let class = load_class(&data.mongodb.db, &class_id).await?;
    let is_owner = class.teacher_id == profile.user_id;
    let is_self = profile.user_id == student_id;
    if !is_owner && !is_self {
        return Err(ApiError::Permission(
            "cannot view another student's attendance".to_string(),
        ));
    }

    let sessions = load_history(&data.mongodb.db, &class.class_id).await?;
    Ok(HttpResponse::Ok().json(stats::student_stats(&sessions, &student_id)))
}

#[cfg(test)]
mod tests {
    use super::staged_present;

    #[test]
    fn staged_present_dedupes_and_keeps_every_staged_id() {
        let staged = staged_present(
            ["s1", "s2", "s1", "s9"].iter().map(|s| s.to_string()).collect(),
        );
        // "s9" is not on any roster yet and must still be written.
        let expected: Vec<String> = ["s1", "s2", "s9"].iter().map(|s| s.to_string()).collect();
        assert_eq!(staged, expected);
    }
}
