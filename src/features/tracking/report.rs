//! Period statistics.
//!
//! Periods are calendar-aligned on the user's local date: a day is that
//! date, a week starts on Monday, a month starts on the 1st. Ranges are
//! half-open (`start` included, `end` excluded) and are matched against the
//! date an entry was stopped on.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::{format_hhmm, start_of_month, start_of_next_month, start_of_week};

/// Statistics period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Day,
    Week,
    Month,
}

impl StatsPeriod {
    /// Parse a selector. Accepts the full word and short forms.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "today" | "d" => Some(Self::Day),
            "week" | "w" => Some(Self::Week),
            "month" | "m" => Some(Self::Month),
            _ => None,
        }
    }

    /// The calendar range containing `today`.
    #[must_use]
    pub fn range_for(self, today: NaiveDate) -> PeriodRange {
        match self {
            Self::Day => PeriodRange::new(today, today + Duration::days(1)),
            Self::Week => {
                let start = start_of_week(today);
                PeriodRange::new(start, start + Duration::days(7))
            }
            Self::Month => PeriodRange::new(start_of_month(today), start_of_next_month(today)),
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Day => "Today",
            Self::Week => "This week",
            Self::Month => "This month",
        }
    }

    /// The command word, as typed in `stats <selector>`.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub const ALL: [Self; 3] = [Self::Day, Self::Week, Self::Month];
}

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Time spent on one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    pub project: String,
    pub duration: String,
    pub duration_ms: i64,
}

/// Totals per project for one period, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodReport {
    pub period: StatsPeriod,
    pub range: PeriodRange,
    pub projects: Vec<ProjectTotal>,
    pub total: String,
    pub total_ms: i64,
}

impl PeriodReport {
    /// Build a report from the gateway's per-project totals.
    #[must_use]
    pub fn from_totals(
        period: StatsPeriod,
        range: PeriodRange,
        totals: &BTreeMap<String, Duration>,
    ) -> Self {
        let mut rows: Vec<(&String, &Duration)> = totals.iter().collect();
        // BTreeMap already yields names in order; the stable sort keeps it for ties.
        rows.sort_by(|a, b| b.1.cmp(a.1));

        let total = totals.values().fold(Duration::zero(), |acc, d| acc + *d);

        Self {
            period,
            range,
            projects: rows
                .into_iter()
                .map(|(project, d)| ProjectTotal {
                    project: project.clone(),
                    duration: format_hhmm(*d),
                    duration_ms: d.num_milliseconds(),
                })
                .collect(),
            total: format_hhmm(total),
            total_ms: total.num_milliseconds(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Plain-text rendering used in chat replies.
    #[must_use]
    pub fn format_text(&self) -> String {
        let title = self.period.display_name();
        if self.is_empty() {
            return format!("{title}: no time recorded yet.");
        }

        let mut lines = vec![format!("{title}:")];
        for row in &self.projects {
            lines.push(format!("{}  {}", row.duration, row.project));
        }
        lines.push(format!("{}  total", self.total));
        lines.join("\n")
    }
}
