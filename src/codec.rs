// src/codec.rs
//
// Mapping between `AttendanceSession` and its stored BSON document in the
// `attendance` collection. Documents are keyed by `{class_id}_{date}` so the
// store itself enforces one session per class per day.

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{doc, Bson, Document};

use crate::errors::ApiError;
use crate::models::AttendanceSession;

/// Composite document id: one session per class per calendar day.
pub fn session_key(class_id: &str, date: &str) -> String {
    format!("{}_{}", class_id, date)
}

/// Timestamps are stored as fixed-width RFC 3339 UTC strings
/// (`YYYY-MM-DDTHH:MM:SSZ`), so lexicographic comparison in query filters
/// matches chronological order.
pub fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn encode(session: &AttendanceSession) -> Document {
    doc! {
        "_id": session_key(&session.class_id, &session.date),
        "class_id": &session.class_id,
        "date": &session.date,
        "start_time": timestamp(&session.start_time),
        "end_time": timestamp(&session.end_time),
        "present": &session.present,
        "created_by": &session.created_by,
    }
}

fn required_str(doc: &Document, key: &str) -> Result<String, ApiError> {
    doc.get_str(key)
        .map(|s| s.to_string())
        .map_err(|_| ApiError::Malformed(format!("attendance document missing {}", key)))
}

fn parse_timestamp(raw: &str, key: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::Malformed(format!("attendance document has invalid {}", key)))
}

/// Decode a stored session document.
///
/// Decoding is defensive about optional fields: a missing `present` list
/// becomes an empty set and a missing `created_by` becomes an empty string,
/// so legacy documents still load. Key fields and timestamps are required.
pub fn decode(doc: &Document) -> Result<AttendanceSession, ApiError> {
    let class_id = required_str(doc, "class_id")?;
    let date = required_str(doc, "date")?;
    let start_time = parse_timestamp(&required_str(doc, "start_time")?, "start_time")?;
    let end_time = parse_timestamp(&required_str(doc, "end_time")?, "end_time")?;

    let present = match doc.get_array("present") {
        Ok(items) => items
            .iter()
            .filter_map(|v| match v {
                Bson::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    let created_by = doc.get_str("created_by").unwrap_or_default().to_string();

    Ok(AttendanceSession {
        class_id,
        date,
        start_time,
        end_time,
        present,
        created_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_session() -> AttendanceSession {
        AttendanceSession {
            class_id: "c1".to_string(),
            date: "2026-03-02".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 10, 0).unwrap(),
            present: vec!["s1".to_string(), "s2".to_string()],
            created_by: "t1".to_string(),
        }
    }

    #[test]
    fn key_is_class_id_underscore_date() {
        assert_eq!(session_key("c1", "2026-03-02"), "c1_2026-03-02");
    }

    #[test]
    fn encode_sets_composite_id_and_fields() {
        let doc = encode(&sample_session());
        assert_eq!(doc.get_str("_id").unwrap(), "c1_2026-03-02");
        assert_eq!(doc.get_str("end_time").unwrap(), "2026-03-02T09:10:00Z");
        assert_eq!(doc.get_array("present").unwrap().len(), 2);
    }

    #[test]
    fn decode_restores_encoded_session() {
        let original = sample_session();
        let decoded = decode(&encode(&original)).unwrap();
        assert_eq!(decoded.class_id, original.class_id);
        assert_eq!(decoded.date, original.date);
        assert_eq!(decoded.start_time, original.start_time);
        assert_eq!(decoded.end_time, original.end_time);
        assert_eq!(decoded.present, original.present);
        assert_eq!(decoded.created_by, original.created_by);
    }

    #[test]
    fn decode_defaults_missing_present_to_empty() {
        let doc = doc! {
            "class_id": "c1",
            "date": "2026-03-02",
            "start_time": "2026-03-02T09:00:00Z",
            "end_time": "2026-03-02T09:10:00Z",
        };
        let session = decode(&doc).unwrap();
        assert!(session.present.is_empty());
        assert_eq!(session.created_by, "");
    }

    #[test]
    fn decode_rejects_missing_end_time() {
        let doc = doc! {
            "class_id": "c1",
            "date": "2026-03-02",
            "start_time": "2026-03-02T09:00:00Z",
        };
        assert!(decode(&doc).is_err());
    }

    #[test]
    fn decode_rejects_garbage_timestamp() {
        let doc = doc! {
            "class_id": "c1",
            "date": "2026-03-02",
            "start_time": "yesterday",
            "end_time": "2026-03-02T09:10:00Z",
        };
        assert!(decode(&doc).is_err());
    }

    #[test]
    fn timestamps_are_fixed_width_so_string_order_is_time_order() {
        let early = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 9, 1, 0).unwrap();
        assert!(timestamp(&early) < timestamp(&late));
    }
}
