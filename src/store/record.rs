use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::timer::{format_elapsed, format_start_time};

/// Separator between records in the store file
pub const RECORD_SEPARATOR: &str = "\n\n";

/// A completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub subject: String,
    pub start_time: NaiveDateTime,
    pub elapsed: Duration,
}

impl Record {
    /// Text of the record as stored, without the trailing separator
    pub fn render(&self) -> String {
        format!(
            "Subject: {}\nStart Time: {}\nTime spent: {}",
            self.subject,
            format_start_time(&self.start_time),
            format_elapsed(self.elapsed)
        )
    }

    /// Body of the dialog shown when the timer stops
    pub fn summary(&self) -> String {
        format!(
            "Subject: {}\nStart Time: {}\nElapsed Time: {}",
            self.subject,
            format_start_time(&self.start_time),
            format_elapsed(self.elapsed)
        )
    }
}

/// Split store contents into record texts, oldest first.
///
/// Everything after the last separator is an unterminated fragment and is
/// dropped, which includes the empty tail left by the final separator.
pub fn split_records(contents: &str) -> Vec<String> {
    let mut parts: Vec<&str> = contents.split(RECORD_SEPARATOR).collect();
    parts.pop();
    parts.into_iter().map(str::to_string).collect()
}

static RE_SUBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Subject: (.*)$").unwrap());

static RE_START_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Start Time: (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})$").unwrap());

static RE_TIME_SPENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Time spent: (.+)$").unwrap());

/// Record text split into its display fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub subject: String,
    pub start_time: String,
    pub time_spent: String,
}

impl RecordEntry {
    /// Pick the fields out of a stored record; `None` if any is missing.
    pub fn parse(text: &str) -> Option<Self> {
        let field = |re: &Regex| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        Some(Self {
            subject: field(&RE_SUBJECT)?,
            start_time: field(&RE_START_TIME)?,
            time_spent: field(&RE_TIME_SPENT)?,
        })
    }
}
