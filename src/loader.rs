use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{ChartError, LoadFailure};
use crate::models::{DailyAggregate, MonthDataset, MonthKey, OrgDayRecord};

pub const RESOURCE_EXTENSION: &str = "csv";

pub const AGGREGATE_COLUMNS: [&str; 10] = [
    "execution_date",
    "total_executions",
    "avg_executions_per_org",
    "median_executions",
    "percentile_25",
    "percentile_75",
    "percentile_5",
    "percentile_95",
    "org_count",
    "moving_avg_7day",
];

pub const ORG_COLUMNS: [&str; 3] = ["execution_date", "org_id", "workflow_execution_count"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Aggregate,
    OrgDaily,
}

impl ResourceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ResourceKind::Aggregate => "box_plot",
            ResourceKind::OrgDaily => "org_data",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Aggregate => &AGGREGATE_COLUMNS,
            ResourceKind::OrgDaily => &ORG_COLUMNS,
        }
    }

    pub fn file_name(&self, month: &MonthKey) -> String {
        format!("{}_{}.{}", self.prefix(), month, RESOURCE_EXTENSION)
    }
}

/// Where monthly resources come from. Fetches return the raw delimited text.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, resource: &str) -> std::io::Result<String>;
}

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn fetch(&self, resource: &str) -> std::io::Result<String> {
        tokio::fs::read_to_string(self.root.join(resource)).await
    }
}

/// Loads both resources for `month` concurrently. Either both parse or the
/// whole month is reported as unavailable.
pub async fn load_month<S>(source: &S, month: MonthKey) -> Result<MonthDataset, ChartError>
where
    S: DataSource + ?Sized,
{
    let aggregate_name = ResourceKind::Aggregate.file_name(&month);
    let org_name = ResourceKind::OrgDaily.file_name(&month);
    tracing::debug!(%month, aggregate = %aggregate_name, orgs = %org_name, "loading month");

    let (aggregate_text, org_text) = tokio::try_join!(
        fetch_resource(source, &aggregate_name),
        fetch_resource(source, &org_name),
    )
    .map_err(|source| ChartError::unavailable(month, source))?;

    let dataset = parse_month(month, &aggregate_text, &org_text)
        .map_err(|source| ChartError::unavailable(month, source))?;

    tracing::info!(
        %month,
        days = dataset.days.len(),
        org_rows = dataset.orgs.len(),
        "month loaded"
    );
    Ok(dataset)
}

async fn fetch_resource<S>(source: &S, resource: &str) -> Result<String, LoadFailure>
where
    S: DataSource + ?Sized,
{
    source.fetch(resource).await.map_err(|source| LoadFailure::Io {
        resource: resource.to_string(),
        source,
    })
}

pub fn parse_month(
    month: MonthKey,
    aggregate_text: &str,
    org_text: &str,
) -> Result<MonthDataset, LoadFailure> {
    let aggregate_name = ResourceKind::Aggregate.file_name(&month);
    let org_name = ResourceKind::OrgDaily.file_name(&month);

    let mut days: Vec<DailyAggregate> =
        parse_rows(&aggregate_name, ResourceKind::Aggregate, aggregate_text)?;
    if days.is_empty() {
        return Err(LoadFailure::Empty {
            resource: aggregate_name,
        });
    }
    for (index, day) in days.iter().enumerate() {
        for (column, value) in day.measures() {
            if !value.is_finite() || value < 0.0 {
                return Err(LoadFailure::InvalidValue {
                    resource: aggregate_name,
                    row: index + 1,
                    column,
                    value,
                });
            }
        }
    }
    days.sort_by_key(|day| day.date);

    let orgs: Vec<OrgDayRecord> = parse_rows(&org_name, ResourceKind::OrgDaily, org_text)?;

    audit_month(month, &days, &orgs);
    Ok(MonthDataset { month, days, orgs })
}

fn parse_rows<T>(resource: &str, kind: ResourceKind, text: &str) -> Result<Vec<T>, LoadFailure>
where
    T: DeserializeOwned,
{
    if text.trim().is_empty() {
        return Err(LoadFailure::Empty {
            resource: resource.to_string(),
        });
    }

    let csv_failure = |source: csv::Error| LoadFailure::Csv {
        resource: resource.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_failure)?.clone();
    for &column in kind.columns() {
        if !headers.iter().any(|header| header == column) {
            return Err(LoadFailure::MissingColumn {
                resource: resource.to_string(),
                column,
            });
        }
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(csv_failure)?);
    }
    Ok(rows)
}

/// Anomalies that the chart tolerates but that usually point at an upstream
/// export problem.
fn audit_month(month: MonthKey, days: &[DailyAggregate], orgs: &[OrgDayRecord]) {
    for day in days {
        if !month.contains(day.date) {
            tracing::warn!(%month, date = %day.date, "aggregate row outside month");
        }
        if !day.quartiles_ordered() {
            tracing::warn!(
                %month,
                date = %day.date,
                p5 = day.p5,
                p25 = day.p25,
                median = day.median,
                p75 = day.p75,
                p95 = day.p95,
                "percentiles out of order, box will render incoherently"
            );
        }
    }

    let covered: HashSet<_> = days.iter().map(|day| day.date).collect();
    let uncovered = orgs.iter().filter(|row| !covered.contains(&row.date)).count();
    if uncovered > 0 {
        tracing::warn!(%month, uncovered, "org rows on days without an aggregate row");
    }
}
