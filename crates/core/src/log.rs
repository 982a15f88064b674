//! Display logs for chat, perception and reasoning output.

use chrono::NaiveTime;
use std::collections::VecDeque;

pub const DEFAULT_MAX_ENTRIES: usize = 1000;

const STAMP_FORMAT: &str = "%H:%M:%S";

pub fn format_stamp(at: NaiveTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// Split a `[HH:MM:SS] text` line into its server stamp and text.
///
/// Only a bracketed prefix that parses as a clock time counts as a stamp, so
/// tags such as `[CORTEX]` stay part of the text.
pub fn split_server_stamp(line: &str) -> (Option<&str>, &str) {
    let Some(rest) = line.strip_prefix('[') else {
        return (None, line);
    };
    let Some((stamp, text)) = rest.split_once("] ") else {
        return (None, line);
    };
    if NaiveTime::parse_from_str(stamp, STAMP_FORMAT).is_ok() {
        (Some(stamp), text)
    } else {
        (None, line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub stamp: String,
    pub text: String,
}

impl LogEntry {
    pub fn new(at: NaiveTime, text: impl Into<String>) -> Self {
        Self {
            stamp: format_stamp(at),
            text: text.into(),
        }
    }

    /// Build an entry from a history line, keeping its server stamp if present.
    pub fn from_history_line(line: &str, at: NaiveTime) -> Self {
        match split_server_stamp(line) {
            (Some(stamp), text) => Self {
                stamp: stamp.to_string(),
                text: text.to_string(),
            },
            (None, text) => Self::new(at, text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub stamp: String,
    pub role: String,
    pub content: String,
}

impl ChatEntry {
    pub fn new(at: NaiveTime, role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            stamp: format_stamp(at),
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Ordered log, appended incrementally or replaced by a snapshot.
///
/// Holds at most `max_entries`; the oldest entries go first.
#[derive(Debug, Clone)]
pub struct DisplayLog<T> {
    entries: VecDeque<T>,
    max_entries: usize,
}

impl<T> DisplayLog<T> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn replace<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.entries.clear();
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for DisplayLog<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
