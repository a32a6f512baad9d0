use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weekly meeting slot for a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Weekday name, e.g. "Monday".
    pub day: String,
    pub time: String,
    pub room: String,
}

/// A class as stored in the `classes` collection.
///
/// `students` holds enrolled student ids. Membership is maintained with
/// `$addToSet`, so the list never contains duplicates. Classes are never
/// deleted in-app.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassRecord {
    pub class_id: String,
    pub name: String,
    pub subject: String,
    pub department: String,
    pub year: String,
    pub semester: String,
    pub section: String,
    pub teacher_id: String,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub students: Vec<String>,
    pub created_at: DateTime<Utc>,
}
