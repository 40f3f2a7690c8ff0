// src/domain/history.rs

use crate::domain::fields::DomainField;
use crate::domain::item::{value_text, VersionSnapshot};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// What happened to a field between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Change {
    Added { to: String },
    Changed { from: String, to: String },
    Removed { from: String },
}

/// A single field-level change, attributed to the version that introduced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEvent {
    pub timestamp: String,
    pub actor: Option<String>,
    pub field: DomainField,
    #[serde(flatten)]
    pub change: Change,
}

/// Turns newest-first version snapshots into change events, oldest first.
///
/// Each adjacent pair `(current, previous)` is compared on every domain field;
/// the resulting event carries the timestamp and actor of `current`.
///
/// Events are ordered by parsed timestamp with a stable sort. Timestamps that
/// fail to parse go last, keeping their emission order.
pub fn diff_versions(versions: &[VersionSnapshot]) -> Vec<HistoryEvent> {
    if versions.len() < 2 {
        return Vec::new();
    }

    let mut events = Vec::new();

    for pair in versions.windows(2) {
        let (current, previous) = (&pair[0], &pair[1]);

        for field in DomainField::ALL {
            let key = field.storage_key();
            let before = value_text(previous.fields.get(key));
            let after = value_text(current.fields.get(key));

            let change = match (before, after) {
                (Some(from), Some(to)) if from != to => Change::Changed { from, to },
                (None, Some(to)) => Change::Added { to },
                (Some(from), None) => Change::Removed { from },
                _ => continue,
            };

            events.push(HistoryEvent {
                timestamp: current.modified.clone(),
                actor: current.modified_by.clone(),
                field,
                change,
            });
        }
    }

    events.sort_by_cached_key(|event| {
        let parsed = parse_timestamp(&event.timestamp);
        (parsed.is_none(), parsed)
    });

    events
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}
