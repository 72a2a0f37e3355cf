use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::loader::ResourceKind;
use crate::models::MonthKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCount {
    pub month: MonthKey,
    pub aggregate_rows: usize,
    pub org_rows: usize,
}

/// Splits all-time exports into per-month resources under `out_dir`. The
/// aggregate export decides which months exist; rows are copied verbatim.
pub fn split_exports(
    box_plot: &Path,
    org_data: &Path,
    out_dir: &Path,
) -> anyhow::Result<Vec<SplitCount>> {
    let (aggregate_header, aggregates) = read_by_month(box_plot)?;
    let (org_header, mut orgs) = read_by_month(org_data)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut counts = Vec::new();
    for (month, rows) in &aggregates {
        let org_rows = orgs.remove(month).unwrap_or_default();
        write_month(
            &out_dir.join(ResourceKind::Aggregate.file_name(month)),
            &aggregate_header,
            rows,
        )?;
        write_month(
            &out_dir.join(ResourceKind::OrgDaily.file_name(month)),
            &org_header,
            &org_rows,
        )?;
        tracing::info!(
            %month,
            days = rows.len(),
            org_rows = org_rows.len(),
            "month written"
        );
        counts.push(SplitCount {
            month: *month,
            aggregate_rows: rows.len(),
            org_rows: org_rows.len(),
        });
    }

    if !orgs.is_empty() {
        tracing::warn!(
            months = orgs.len(),
            "org export has months missing from the aggregate export, skipped"
        );
    }

    Ok(counts)
}

type MonthRows = BTreeMap<MonthKey, Vec<csv::StringRecord>>;

fn read_by_month(path: &Path) -> anyhow::Result<(csv::StringRecord, MonthRows)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = reader.headers()?.clone();
    let date_column = header
        .iter()
        .position(|name| name.trim() == "execution_date")
        .with_context(|| format!("{} has no execution_date column", path.display()))?;

    let mut months: MonthRows = BTreeMap::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let date = record.get(date_column).unwrap_or_default().trim();
        let month: MonthKey = date
            .get(..7)
            .unwrap_or(date)
            .parse()
            .with_context(|| format!("{} row {}: bad date {date:?}", path.display(), index + 1))?;
        months.entry(month).or_default().push(record);
    }

    Ok((header, months))
}

fn write_month(
    path: &Path,
    header: &csv::StringRecord,
    rows: &[csv::StringRecord],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
