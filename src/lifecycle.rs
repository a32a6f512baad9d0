// src/lifecycle.rs
//
// Pure attendance-window logic. Every function takes `now` explicitly so the
// window rules can be tested at fixed timestamps; handlers pass `Utc::now()`
// once per request. The check at mutation time is authoritative — the
// countdown shown to clients is display only.

use chrono::{DateTime, Duration, Utc};

use crate::errors::ApiError;
use crate::models::AttendanceSession;

/// Window state of an existing session. The absence of a session document is
/// the third state ("no session today") and is handled by the callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

pub fn status(session: &AttendanceSession, now: DateTime<Utc>) -> SessionStatus {
    if now > session.end_time {
        SessionStatus::Closed
    } else {
        SessionStatus::Open
    }
}

/// Build a fresh session window: `end_time = now + duration`, nobody present.
/// Writing it over an existing document for the same day is the defined way
/// to re-open a closed window; the previous `present` list is discarded.
pub fn open_window(
    class_id: &str,
    teacher_id: &str,
    now: DateTime<Utc>,
    duration_minutes: i64,
) -> AttendanceSession {
    AttendanceSession {
        class_id: class_id.to_string(),
        date: now.format("%Y-%m-%d").to_string(),
        start_time: now,
        end_time: now + Duration::minutes(duration_minutes),
        present: Vec::new(),
        created_by: teacher_id.to_string(),
    }
}

/// The authoritative window check, re-evaluated on every mutating call.
pub fn check_open(session: &AttendanceSession, now: DateTime<Utc>) -> Result<(), ApiError> {
    if now > session.end_time {
        return Err(ApiError::SessionExpired);
    }
    Ok(())
}

/// Flip a student's membership in the staged `present` set. Self-inverse.
/// Past the window this fails and leaves the staged copy untouched.
pub fn toggle_present(
    session: &mut AttendanceSession,
    student_id: &str,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    check_open(session, now)?;
    if let Some(pos) = session.present.iter().position(|id| id == student_id) {
        session.present.remove(pos);
    } else {
        session.present.push(student_id.to_string());
    }
    Ok(())
}

/// Append a student to `present` if absent. A duplicate attempt is an error
/// and never grows the set.
pub fn mark_present(
    session: &mut AttendanceSession,
    student_id: &str,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    check_open(session, now)?;
    if session.present.iter().any(|id| id == student_id) {
        return Err(ApiError::AlreadyMarked);
    }
    session.present.push(student_id.to_string());
    Ok(())
}

/// Seconds left in the window, clamped at zero, for countdown display.
pub fn remaining_seconds(session: &AttendanceSession, now: DateTime<Utc>) -> i64 {
    (session.end_time - now).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn open_window_spans_duration_with_empty_present() {
        let session = open_window("c1", "t1", t0(), 10);
        assert_eq!(session.date, "2026-03-02");
        assert_eq!(session.end_time, t0() + minutes(10));
        assert!(session.present.is_empty());
        assert_eq!(session.created_by, "t1");
    }

    #[test]
    fn window_is_open_up_to_and_including_end_time() {
        let session = open_window("c1", "t1", t0(), 10);
        assert_eq!(status(&session, t0() + minutes(10)), SessionStatus::Open);
        assert_eq!(
            status(&session, t0() + minutes(10) + Duration::seconds(1)),
            SessionStatus::Closed
        );
    }

    #[test]
    fn toggle_is_self_inverse() {
        let mut session = open_window("c1", "t1", t0(), 10);
        session.present = vec!["s1".to_string()];
        let before = session.present.clone();

        toggle_present(&mut session, "s2", t0() + minutes(1)).unwrap();
        assert!(session.present.contains(&"s2".to_string()));
        toggle_present(&mut session, "s2", t0() + minutes(2)).unwrap();
        assert_eq!(session.present, before);
    }

    #[test]
    fn toggle_after_expiry_fails_without_mutation() {
        let mut session = open_window("c1", "t1", t0(), 10);
        let err = toggle_present(&mut session, "s1", t0() + minutes(11)).unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert!(session.present.is_empty());
    }

    #[test]
    fn second_mark_is_rejected_and_set_grows_by_one() {
        let mut session = open_window("c1", "t1", t0(), 10);
        mark_present(&mut session, "s1", t0() + minutes(2)).unwrap();
        let err = mark_present(&mut session, "s1", t0() + minutes(3)).unwrap_err();
        assert!(matches!(err, ApiError::AlreadyMarked));
        assert_eq!(session.present.len(), 1);
    }

    #[test]
    fn remaining_seconds_clamps_at_zero() {
        let session = open_window("c1", "t1", t0(), 10);
        assert_eq!(remaining_seconds(&session, t0()), 600);
        assert_eq!(remaining_seconds(&session, t0() + minutes(4)), 360);
        assert_eq!(remaining_seconds(&session, t0() + minutes(11)), 0);
    }

    // Full window scenario: open at T0, marks at T0+2m and T0+3m, teacher
    // save staged at T0+5m, everything rejected at T0+11m.
    #[test]
    fn window_scenario_end_to_end() {
        let mut session = open_window("c1", "t1", t0(), 10);
        assert_eq!(session.end_time, t0() + minutes(10));

        mark_present(&mut session, "s1", t0() + minutes(2)).unwrap();
        assert_eq!(session.present, vec!["s1".to_string()]);

        let err = mark_present(&mut session, "s1", t0() + minutes(3)).unwrap_err();
        assert!(matches!(err, ApiError::AlreadyMarked));

        // Teacher stages s2 on a working copy and saves inside the window.
        let mut staged = session.clone();
        toggle_present(&mut staged, "s2", t0() + minutes(5)).unwrap();
        check_open(&staged, t0() + minutes(5)).unwrap();
        assert_eq!(staged.present, vec!["s1".to_string(), "s2".to_string()]);

        let late = t0() + minutes(11);
        assert!(check_open(&staged, late).is_err());
        assert!(mark_present(&mut staged, "s3", late).is_err());
        assert!(toggle_present(&mut staged, "s1", late).is_err());
        assert_eq!(staged.present, vec!["s1".to_string(), "s2".to_string()]);
    }
}
