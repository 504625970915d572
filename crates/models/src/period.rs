use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One processing period (a calendar month).
///
/// The folder hierarchy uses its two segments (`"2025"`, `"03"`); rows and
/// sheet names use the combined `"2025-03"` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `"YYYY-MM"` label.
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    /// Year folder name, e.g. `"2025"`.
    pub fn year_segment(&self) -> String {
        self.year.to_string()
    }

    /// Month folder name, zero-padded, e.g. `"03"`.
    pub fn month_segment(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Combined label, e.g. `"2025-03"`.
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
