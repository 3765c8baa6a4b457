//! Append-only run logs, partitioned by execution context.
//!
//! Merging is plain per-context concatenation: nothing is filtered or
//! deduplicated here. The backend filters by the watermark passed as
//! `from_time`, and the watermark itself is [`last_timestamp`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::timestamp::epoch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub stdout: String,
    pub stderr: String,
}

/// Context name → entries in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogCollection(BTreeMap<String, Vec<LogEntry>>);

impl LogCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no context holds any entry.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn entry_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn context(&self, name: &str) -> &[LogEntry] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push(&mut self, context: impl Into<String>, entry: LogEntry) {
        self.0.entry(context.into()).or_default().push(entry);
    }

    /// Every entry with its context, contexts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LogEntry)> {
        self.0
            .iter()
            .flat_map(|(context, entries)| entries.iter().map(move |e| (context.as_str(), e)))
    }

    /// Append `incoming` in place. Returns false, leaving `self` untouched,
    /// when `incoming` holds no entries.
    pub fn append(&mut self, incoming: LogCollection) -> bool {
        if incoming.is_empty() {
            return false;
        }
        for (context, entries) in incoming.0 {
            if entries.is_empty() {
                continue;
            }
            self.0.entry(context).or_default().extend(entries);
        }
        true
    }

    /// Newest timestamp across all contexts, or the epoch when empty.
    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.0
            .values()
            .flatten()
            .map(|entry| entry.timestamp)
            .max()
            .unwrap_or_else(epoch)
    }
}

impl<C: Into<String>> FromIterator<(C, LogEntry)> for LogCollection {
    fn from_iter<I: IntoIterator<Item = (C, LogEntry)>>(iter: I) -> Self {
        let mut logs = LogCollection::new();
        for (context, entry) in iter {
            logs.push(context, entry);
        }
        logs
    }
}

/// Per-context concatenation of `existing` then `incoming`.
///
/// An empty `incoming` hands `existing` back as is, buffers included.
pub fn merge(mut existing: LogCollection, incoming: LogCollection) -> LogCollection {
    existing.append(incoming);
    existing
}

/// Watermark for the next logs fetch.
pub fn last_timestamp(logs: Option<&LogCollection>) -> DateTime<Utc> {
    logs.map(LogCollection::last_timestamp)
        .unwrap_or_else(epoch)
}
