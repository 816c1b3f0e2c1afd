//! Read-only derivations over a history snapshot.
//!
//! All functions take the records newest-first as stored and return owned
//! copies; none of them touch storage.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::NotificationRecord;
use crate::search::{any_field_contains, normalize_query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Records sharing one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub unread: usize,
    pub read: usize,
    pub by_type: BTreeMap<String, usize>,
}

pub fn filter_by_read(records: &[NotificationRecord], read: bool) -> Vec<NotificationRecord> {
    records.iter().filter(|r| r.read == read).cloned().collect()
}

pub fn filter_by_type(records: &[NotificationRecord], kind: &str) -> Vec<NotificationRecord> {
    records
        .iter()
        .filter(|r| r.notification_type() == Some(kind))
        .cloned()
        .collect()
}

/// Records received within `[start, end]`, both bounds inclusive
pub fn filter_by_date_range(
    records: &[NotificationRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<NotificationRecord> {
    records
        .iter()
        .filter(|r| r.received_at >= start && r.received_at <= end)
        .cloned()
        .collect()
}

pub fn sorted(records: &[NotificationRecord], order: SortOrder) -> Vec<NotificationRecord> {
    let mut out = records.to_vec();
    match order {
        SortOrder::NewestFirst => out.sort_by(|a, b| b.received_at.cmp(&a.received_at)),
        SortOrder::OldestFirst => out.sort_by(|a, b| a.received_at.cmp(&b.received_at)),
    }
    out
}

/// Group by the UTC date of `receivedAt`; newest day first, newest record first
pub fn group_by_day(records: &[NotificationRecord]) -> Vec<DayGroup> {
    let mut groups: BTreeMap<NaiveDate, Vec<NotificationRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.received_at.date_naive())
            .or_default()
            .push(record.clone());
    }

    groups
        .into_iter()
        .rev()
        .map(|(date, mut records)| {
            records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
            DayGroup { date, records }
        })
        .collect()
}

/// Case-insensitive substring search over title and body
pub fn search(records: &[NotificationRecord], query: &str) -> Vec<NotificationRecord> {
    let term = normalize_query(query);
    records
        .iter()
        .filter(|r| any_field_contains(&[r.title.as_str(), r.body.as_str()], &term))
        .cloned()
        .collect()
}

pub fn stats(records: &[NotificationRecord]) -> HistoryStats {
    let mut stats = HistoryStats {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        if record.read {
            stats.read += 1;
        } else {
            stats.unread += 1;
        }
        *stats
            .by_type
            .entry(record.type_or_default().to_string())
            .or_insert(0) += 1;
    }
    stats
}

pub fn unread_total(records: &[NotificationRecord]) -> u32 {
    records.iter().filter(|r| !r.read).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(id: &str, kind: Option<&str>, at: DateTime<Utc>, read: bool) -> NotificationRecord {
        let data = match kind {
            Some(kind) => json!({ "type": kind }),
            None => json!({}),
        };
        NotificationRecord {
            id: id.to_string(),
            title: format!("Título {}", id),
            body: format!("Contenido de {}", id),
            data: data.as_object().cloned().unwrap_or_default(),
            received_at: at,
            read,
            received_in_background: None,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn sample() -> Vec<NotificationRecord> {
        vec![
            record("d", Some("event"), at(3, 9), false),
            record("c", Some("news"), at(2, 18), true),
            record("b", None, at(2, 8), false),
            record("a", Some("event"), at(1, 12), true),
        ]
    }

    fn ids(records: &[NotificationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_filter_by_read_and_type() {
        let records = sample();
        assert_eq!(ids(&filter_by_read(&records, false)), vec!["d", "b"]);
        assert_eq!(ids(&filter_by_read(&records, true)), vec!["c", "a"]);
        assert_eq!(ids(&filter_by_type(&records, "event")), vec!["d", "a"]);
        assert!(filter_by_type(&records, "alert").is_empty());
    }

    #[test]
    fn test_filter_by_date_range_is_inclusive() {
        let records = sample();
        let hits = filter_by_date_range(&records, at(2, 8), at(2, 18));
        assert_eq!(ids(&hits), vec!["c", "b"]);
    }

    #[test]
    fn test_sorted_both_directions() {
        let records = sample();
        assert_eq!(ids(&sorted(&records, SortOrder::OldestFirst)), vec!["a", "b", "c", "d"]);
        assert_eq!(ids(&sorted(&records, SortOrder::NewestFirst)), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_group_by_day_newest_first() {
        let mut records = sample();
        // Out-of-order input still groups and sorts correctly
        records.swap(1, 2);
        let groups = group_by_day(&records);

        let dates: Vec<String> = groups.iter().map(|g| g.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-03", "2024-05-02", "2024-05-01"]);
        assert_eq!(ids(&groups[1].records), vec!["c", "b"]);
    }

    #[test]
    fn test_search_title_and_body() {
        let records = sample();
        assert_eq!(ids(&search(&records, "TÍTULO d")), vec!["d"]);
        assert_eq!(ids(&search(&records, "contenido de b")), vec!["b"]);
        assert_eq!(search(&records, "  ").len(), 4);
        assert!(search(&records, "taller").is_empty());
    }

    #[test]
    fn test_stats() {
        let stats = stats(&sample());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.unread, 2);
        assert_eq!(stats.read, 2);
        assert_eq!(stats.by_type.get("event"), Some(&2));
        assert_eq!(stats.by_type.get("news"), Some(&1));
        assert_eq!(stats.by_type.get("general"), Some(&1));
    }
}
