use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// One calendar month in the catalog, printed and parsed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, ChartError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ChartError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated in the constructors
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|next| (next - self.first_day()).num_days() as u32)
            .unwrap_or(31)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Human label used in chart titles, e.g. "March 2024".
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ChartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ChartError::InvalidMonth(value.to_string());
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyAggregate {
    #[serde(rename = "execution_date")]
    pub date: NaiveDate,
    pub total_executions: f64,
    pub avg_executions_per_org: f64,
    #[serde(rename = "median_executions")]
    pub median: f64,
    #[serde(rename = "percentile_25")]
    pub p25: f64,
    #[serde(rename = "percentile_75")]
    pub p75: f64,
    #[serde(rename = "percentile_5")]
    pub p5: f64,
    #[serde(rename = "percentile_95")]
    pub p95: f64,
    pub org_count: f64,
    #[serde(rename = "moving_avg_7day")]
    pub moving_avg_7day: f64,
}

impl DailyAggregate {
    /// Every declared measure paired with its column name.
    pub fn measures(&self) -> [(&'static str, f64); 9] {
        [
            ("total_executions", self.total_executions),
            ("avg_executions_per_org", self.avg_executions_per_org),
            ("median_executions", self.median),
            ("percentile_25", self.p25),
            ("percentile_75", self.p75),
            ("percentile_5", self.p5),
            ("percentile_95", self.p95),
            ("org_count", self.org_count),
            ("moving_avg_7day", self.moving_avg_7day),
        ]
    }

    /// True when `p5 <= p25 <= median <= p75 <= p95`.
    pub fn quartiles_ordered(&self) -> bool {
        self.p5 <= self.p25
            && self.p25 <= self.median
            && self.median <= self.p75
            && self.p75 <= self.p95
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrgDayRecord {
    #[serde(rename = "execution_date")]
    pub date: NaiveDate,
    pub org_id: String,
    #[serde(rename = "workflow_execution_count")]
    pub execution_count: u64,
}

/// Both record collections for one month, owned by a single render cycle.
#[derive(Debug, Clone)]
pub struct MonthDataset {
    pub month: MonthKey,
    pub days: Vec<DailyAggregate>,
    pub orgs: Vec<OrgDayRecord>,
}

#[derive(Debug, Clone)]
pub struct OrgTotal {
    pub org_id: String,
    pub executions: u64,
    pub active_days: usize,
}

#[derive(Debug, Clone)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub day_count: usize,
    pub total_executions: f64,
    pub mean_daily_executions: f64,
    pub peak_day: Option<(NaiveDate, f64)>,
    pub distinct_orgs: usize,
    pub median_of_medians: f64,
    pub latest_moving_avg: Option<f64>,
}
