// src/stats.rs
//
// Derived attendance statistics: a pure fold over a class's session history.
// Query results from the store are not guaranteed chronological, so every
// computation sorts by date first.

use serde::Serialize;

use crate::models::AttendanceSession;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStats {
    pub total_classes: usize,
    pub attended_classes: usize,
    /// Percentage in 0..=100, rounded; 0 when there are no sessions.
    pub attendance_percentage: f64,
    /// Length of the longest contiguous run of qualifying sessions, in date
    /// order.
    pub current_streak: usize,
}

fn sorted_by_date(sessions: &[AttendanceSession]) -> Vec<&AttendanceSession> {
    let mut ordered: Vec<&AttendanceSession> = sessions.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date));
    ordered
}

fn fold<F>(sessions: &[AttendanceSession], qualifies: F) -> AttendanceStats
where
    F: Fn(&AttendanceSession) -> bool,
{
    let ordered = sorted_by_date(sessions);
    let total_classes = ordered.len();
    let attended_classes = ordered.iter().filter(|s| qualifies(s)).count();
    let attendance_percentage = if total_classes == 0 {
        0.0
    } else {
        (attended_classes as f64 / total_classes as f64 * 100.0).round()
    };
    let mut current_streak = 0;
    let mut run = 0;
    for session in &ordered {
        if qualifies(session) {
            run += 1;
            current_streak = current_streak.max(run);
        } else {
            run = 0;
        }
    }
    AttendanceStats {
        total_classes,
        attended_classes,
        attendance_percentage,
        current_streak,
    }
}

/// Teacher-facing view: a session counts as attended when anyone was present
/// ("class was held"), distinct from any single student's ratio.
pub fn class_stats(sessions: &[AttendanceSession]) -> AttendanceStats {
    fold(sessions, |s| !s.present.is_empty())
}

/// One student's personal ratio and streak over the same history.
pub fn student_stats(sessions: &[AttendanceSession], student_id: &str) -> AttendanceStats {
    fold(sessions, |s| s.present.iter().any(|id| id == student_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session(date: &str, present: &[&str]) -> AttendanceSession {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        AttendanceSession {
            class_id: "c1".to_string(),
            date: date.to_string(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(10),
            present: present.iter().map(|s| s.to_string()).collect(),
            created_by: "t1".to_string(),
        }
    }

    #[test]
    fn empty_history_is_all_zero_and_never_nan() {
        let stats = class_stats(&[]);
        assert_eq!(
            stats,
            AttendanceStats {
                total_classes: 0,
                attended_classes: 0,
                attendance_percentage: 0.0,
                current_streak: 0,
            }
        );
    }

    #[test]
    fn single_fresh_session_counts_zero_or_one() {
        let empty = class_stats(&[session("2026-03-02", &[])]);
        assert_eq!(empty.total_classes, 1);
        assert_eq!(empty.attended_classes, 0);

        let held = class_stats(&[session("2026-03-02", &["s1"])]);
        assert_eq!(held.attended_classes, 1);
        assert_eq!(held.attendance_percentage, 100.0);
    }

    #[test]
    fn class_streak_is_longest_contiguous_run() {
        let sessions = vec![
            session("2026-03-02", &["s1"]),
            session("2026-03-03", &[]),
            session("2026-03-04", &["s1"]),
            session("2026-03-05", &["s2"]),
        ];
        let stats = class_stats(&sessions);
        assert_eq!(stats.total_classes, 4);
        assert_eq!(stats.attended_classes, 3);
        assert_eq!(stats.current_streak, 2);
    }

    // A longer run earlier in the term must win over a shorter trailing one.
    #[test]
    fn streak_picks_a_longer_non_trailing_run() {
        let sessions = vec![
            session("2026-03-02", &["s1"]),
            session("2026-03-03", &["s2"]),
            session("2026-03-04", &[]),
            session("2026-03-05", &["s1"]),
        ];
        assert_eq!(class_stats(&sessions).current_streak, 2);
    }

    #[test]
    fn streak_is_independent_of_store_iteration_order() {
        let mut sessions = vec![
            session("2026-03-05", &["s2"]),
            session("2026-03-02", &["s1"]),
            session("2026-03-04", &["s1"]),
            session("2026-03-03", &[]),
        ];
        let shuffled = class_stats(&sessions);
        sessions.sort_by(|a, b| a.date.cmp(&b.date));
        assert_eq!(shuffled, class_stats(&sessions));
        assert_eq!(shuffled.current_streak, 2);
    }

    #[test]
    fn student_ratio_only_counts_own_marks() {
        let sessions = vec![
            session("2026-03-02", &["s1", "s2"]),
            session("2026-03-03", &["s2"]),
            session("2026-03-04", &["s1"]),
            session("2026-03-05", &["s1"]),
        ];
        let stats = student_stats(&sessions, "s1");
        assert_eq!(stats.total_classes, 4);
        assert_eq!(stats.attended_classes, 3);
        assert_eq!(stats.attendance_percentage, 75.0);
        assert_eq!(stats.current_streak, 2);

        let absent = student_stats(&sessions, "s9");
        assert_eq!(stats.total_classes, absent.total_classes);
        assert_eq!(absent.attended_classes, 0);
        assert_eq!(absent.attendance_percentage, 0.0);
        assert_eq!(absent.current_streak, 0);
    }
}
