// src/roster.rs
//
// Roster ordering and reconciliation. A student visiting a class's attendance
// screen is auto-enrolled ("ad-hoc enrollment"), so the roster is self-healing
// rather than teacher-curated.

use std::cmp::Ordering;

use log::info;
use mongodb::bson::doc;
use mongodb::Database;
use serde::Serialize;

use crate::errors::ApiError;
use crate::models::{ClassRecord, StudentRecord, UserProfile};

/// One roster row as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub user_id: String,
    pub full_name: String,
    pub roll_no: String,
}

/// Numeric roll numbers sort ascending by value; non-numeric entries
/// ("N/A", exchange-student codes) sort after all numeric ones, between
/// themselves by plain string order.
pub fn roll_no_order(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn sort_roster(entries: &mut [RosterEntry]) {
    entries.sort_by(|a, b| roll_no_order(&a.roll_no, &b.roll_no));
}

/// Make sure `student` is a recognized member of `class`.
///
/// If the student id is missing from the class roster this writes the minimal
/// per-class student record (upsert) and then appends the id to
/// `classes.students` with `$addToSet`, which is atomic and keeps the list
/// duplicate-free even under concurrent enrollments.
pub async fn ensure_enrolled(
    db: &Database,
    class: &ClassRecord,
    student: &UserProfile,
) -> Result<(), ApiError> {
    if class.students.iter().any(|id| id == &student.user_id) {
        return Ok(());
    }

    let record = StudentRecord {
        user_id: student.user_id.clone(),
        full_name: student.full_name.clone(),
        roll_no: student.roll_no.clone(),
        class_id: class.class_id.clone(),
    };
    let students = db.collection::<StudentRecord>("students");
    students
        .update_one(
            doc! { "user_id": &record.user_id, "class_id": &record.class_id },
            doc! { "$setOnInsert": {
                "user_id": &record.user_id,
                "full_name": &record.full_name,
                "roll_no": &record.roll_no,
                "class_id": &record.class_id,
            }},
        )
        .upsert(true)
        .await?;

    let classes = db.collection::<ClassRecord>("classes");
    classes
        .update_one(
            doc! { "class_id": &class.class_id },
            doc! { "$addToSet": { "students": &student.user_id } },
        )
        .await?;

    info!(
        "auto-enrolled student {} into class {}",
        student.user_id, class.class_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(roll_no: &str) -> RosterEntry {
        RosterEntry {
            user_id: format!("u-{}", roll_no),
            full_name: format!("Student {}", roll_no),
            roll_no: roll_no.to_string(),
        }
    }

    #[test]
    fn numeric_rolls_sort_by_value_with_non_numeric_last() {
        let mut entries = vec![entry("10"), entry("2"), entry("N/A"), entry("1")];
        sort_roster(&mut entries);
        let rolls: Vec<&str> = entries.iter().map(|e| e.roll_no.as_str()).collect();
        assert_eq!(rolls, vec!["1", "2", "10", "N/A"]);
    }

    #[test]
    fn non_numeric_rolls_keep_string_order_among_themselves() {
        let mut entries = vec![entry("X2"), entry("3"), entry("A1")];
        sort_roster(&mut entries);
        let rolls: Vec<&str> = entries.iter().map(|e| e.roll_no.as_str()).collect();
        assert_eq!(rolls, vec!["3", "A1", "X2"]);
    }

    #[test]
    fn whitespace_around_numeric_rolls_is_ignored() {
        assert_eq!(roll_no_order(" 7 ", "10"), Ordering::Less);
        assert_eq!(roll_no_order("10", " 7 "), Ordering::Greater);
    }
}
