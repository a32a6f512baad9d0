use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of an account, chosen explicitly at sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

/// A user profile as stored in the `users` collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub full_name: String,
    pub roll_no: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: Role,
    /// The class a student is enrolled in, if any.
    #[serde(default)]
    pub class_id: Option<String>,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

/// Minimal per-class mirror of a student, written by the roster reconciler
/// into the `students` collection the first time a student interacts with
/// a class.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentRecord {
    pub user_id: String,
    pub full_name: String,
    pub roll_no: String,
    pub class_id: String,
}
