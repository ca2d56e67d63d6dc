use chrono::{DateTime, Utc};

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Client-side record id for rows that never reached the table store.
pub(crate) fn new_local_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a store timestamp into epoch milliseconds.
///
/// The table store returns `timestamptz` columns as ISO-8601 strings; rows written by
/// older clients may carry a bare millisecond number instead.
pub(crate) fn timestamp_to_ms(v: &serde_json::Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let s = v.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc).timestamp_millis())
        .ok()
        .or_else(|| {
            // PostgREST omits the `T` separator for some column types.
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|d| d.and_utc().timestamp_millis())
                .ok()
        })
}

pub(crate) fn starts_with_ignore_case(word: &str, prefix: &str) -> bool {
    word.to_lowercase().starts_with(&prefix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_to_ms_rfc3339() {
        let v = serde_json::json!("2024-03-01T10:00:00.500+00:00");
        assert_eq!(timestamp_to_ms(&v), Some(1_709_287_200_500));
    }

    #[test]
    fn test_timestamp_to_ms_space_separated() {
        let v = serde_json::json!("2024-03-01 10:00:00");
        assert_eq!(timestamp_to_ms(&v), Some(1_709_287_200_000));
    }

    #[test]
    fn test_timestamp_to_ms_number_and_garbage() {
        assert_eq!(timestamp_to_ms(&serde_json::json!(42)), Some(42));
        assert_eq!(timestamp_to_ms(&serde_json::json!("yesterday")), None);
        assert_eq!(timestamp_to_ms(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_new_local_id_is_unique() {
        assert_ne!(new_local_id(), new_local_id());
        assert_eq!(new_local_id().len(), 36);
    }

    #[test]
    fn test_starts_with_ignore_case() {
        assert!(starts_with_ignore_case("Être", "êt"));
        assert!(starts_with_ignore_case("manger", "MAN"));
        assert!(!starts_with_ignore_case("ami", "ma"));
    }
}
