use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;

use crate::loader::{self, DataSource, AGGREGATE_COLUMNS, ORG_COLUMNS};
use crate::models::{MonthDataset, MonthKey};

#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn with(mut self, name: &str, contents: &str) -> Self {
        self.files.insert(name.to_string(), contents.to_string());
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self, resource: &str) -> std::io::Result<String> {
        self.files.get(resource).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, resource.to_string())
        })
    }
}

/// Rows are `(date, p5, p25, median, p75, p95, moving_avg)`.
pub fn aggregate_csv(rows: &[(&str, f64, f64, f64, f64, f64, f64)]) -> String {
    let mut text = AGGREGATE_COLUMNS.join(",");
    text.push('\n');
    for (date, p5, p25, median, p75, p95, moving) in rows {
        text.push_str(&format!(
            "{date},{total},{avg},{median},{p25},{p75},{p5},{p95},{orgs},{moving}\n",
            total = median * 10.0,
            avg = median,
            orgs = 10,
        ));
    }
    text
}

pub fn org_csv(rows: &[(&str, &str, u64)]) -> String {
    let mut text = ORG_COLUMNS.join(",");
    text.push('\n');
    for (date, org, count) in rows {
        text.push_str(&format!("{date},{org},{count}\n"));
    }
    text
}

pub fn full_month_aggregate_csv(month: MonthKey) -> String {
    let dates: Vec<String> = (0..month.days_in_month())
        .map(|offset| (month.first_day() + Duration::days(offset as i64)).to_string())
        .collect();
    let rows: Vec<_> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let base = i as f64;
            (
                date.as_str(),
                base,
                base + 2.0,
                base + 4.0,
                base + 7.0,
                base + 12.0,
                base + 3.5,
            )
        })
        .collect();
    aggregate_csv(&rows)
}

/// Three days, two organizations, hand-checked bounds:
/// whiskers [2,15] [3,16] [1,14], trend 5 → 6 → 5.5.
pub fn three_day_dataset() -> MonthDataset {
    let month: MonthKey = "2024-03".parse().unwrap();
    let aggregates = aggregate_csv(&[
        ("2024-03-01", 2.0, 4.0, 6.0, 9.0, 15.0, 5.0),
        ("2024-03-02", 3.0, 5.0, 7.0, 10.0, 16.0, 6.0),
        ("2024-03-03", 1.0, 3.0, 5.0, 8.0, 14.0, 5.5),
    ]);
    let orgs = org_csv(&[
        ("2024-03-01", "org-a", 4),
        ("2024-03-01", "org-b", 12),
        ("2024-03-02", "org-a", 6),
        ("2024-03-03", "org-b", 9),
        ("2024-03-03", "org-a", 3),
    ]);
    loader::parse_month(month, &aggregates, &orgs).unwrap()
}

pub fn three_day_source() -> MemorySource {
    MemorySource::default()
        .with(
            "box_plot_2024-03.csv",
            &aggregate_csv(&[
                ("2024-03-01", 2.0, 4.0, 6.0, 9.0, 15.0, 5.0),
                ("2024-03-02", 3.0, 5.0, 7.0, 10.0, 16.0, 6.0),
                ("2024-03-03", 1.0, 3.0, 5.0, 8.0, 14.0, 5.5),
            ]),
        )
        .with(
            "org_data_2024-03.csv",
            &org_csv(&[("2024-03-01", "org-a", 4), ("2024-03-02", "org-b", 7)]),
        )
        .with(
            "box_plot_2024-04.csv",
            &aggregate_csv(&[("2024-04-01", 1.0, 2.0, 3.0, 4.0, 5.0, 3.0)]),
        )
        .with(
            "org_data_2024-04.csv",
            &org_csv(&[("2024-04-01", "org-c", 3)]),
        )
}
