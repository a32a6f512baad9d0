use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attendance session: a time-boxed window during which students of one
/// class may mark themselves present on one calendar day.
///
/// Stored in the `attendance` collection under the composite key
/// `{class_id}_{date}` (see `codec::session_key`), so there is at most one
/// session document per class per day. `end_time` is the hard close of the
/// marking window; once the clock passes it no presence mutation is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub class_id: String,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Ids of students marked present, no duplicates.
    #[serde(default)]
    pub present: Vec<String>,
    pub created_by: String,
}
