use std::fmt::Write;

use crate::models::{MonthDataset, MonthSummary, OrgTotal};

pub fn summarize_orgs(dataset: &MonthDataset) -> Vec<OrgTotal> {
    let mut map: std::collections::HashMap<&str, (u64, usize)> =
        std::collections::HashMap::new();

    for record in &dataset.orgs {
        let entry = map.entry(record.org_id.as_str()).or_insert((0, 0));
        entry.0 += record.execution_count;
        entry.1 += 1;
    }

    let mut totals: Vec<OrgTotal> = map
        .into_iter()
        .map(|(org_id, (executions, active_days))| OrgTotal {
            org_id: org_id.to_string(),
            executions,
            active_days,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.executions
            .cmp(&a.executions)
            .then_with(|| a.org_id.cmp(&b.org_id))
    });
    totals
}

pub fn summarize_month(dataset: &MonthDataset) -> MonthSummary {
    let day_count = dataset.days.len();
    let total_executions: f64 = dataset.days.iter().map(|d| d.total_executions).sum();
    let peak_day = dataset
        .days
        .iter()
        .max_by(|a, b| {
            a.total_executions
                .partial_cmp(&b.total_executions)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|d| (d.date, d.total_executions));

    let mut medians: Vec<f64> = dataset.days.iter().map(|d| d.median).collect();
    medians.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_of_medians = match medians.len() {
        0 => 0.0,
        n if n % 2 == 1 => medians[n / 2],
        n => (medians[n / 2 - 1] + medians[n / 2]) / 2.0,
    };

    let distinct_orgs = dataset
        .orgs
        .iter()
        .map(|r| r.org_id.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    MonthSummary {
        month: dataset.month,
        day_count,
        total_executions,
        mean_daily_executions: if day_count == 0 {
            0.0
        } else {
            total_executions / day_count as f64
        },
        peak_day,
        distinct_orgs,
        median_of_medians,
        latest_moving_avg: dataset.days.last().map(|d| d.moving_avg_7day),
    }
}

pub fn build_report(dataset: &MonthDataset, top: usize) -> String {
    let summary = summarize_month(dataset);
    let orgs = summarize_orgs(dataset);

    let mut output = String::new();

    let _ = writeln!(output, "# Workflow Execution Report");
    let _ = writeln!(
        output,
        "Generated for {} ({})",
        summary.month.label(),
        summary.month
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Month at a Glance");
    let _ = writeln!(output, "- Days reported: {}", summary.day_count);
    let _ = writeln!(output, "- Total executions: {:.0}", summary.total_executions);
    let _ = writeln!(
        output,
        "- Mean daily executions: {:.1}",
        summary.mean_daily_executions
    );
    match summary.peak_day {
        Some((date, total)) => {
            let _ = writeln!(output, "- Peak day: {date} ({total:.0} executions)");
        }
        None => {
            let _ = writeln!(output, "- Peak day: n/a");
        }
    }
    let _ = writeln!(output, "- Active organizations: {}", summary.distinct_orgs);
    let _ = writeln!(
        output,
        "- Median of daily medians: {:.1}",
        summary.median_of_medians
    );
    if let Some(latest) = summary.latest_moving_avg {
        let _ = writeln!(output, "- Latest 7-day moving average: {latest:.1}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Busiest Organizations");

    if orgs.is_empty() {
        let _ = writeln!(output, "No organization activity recorded for this month.");
    } else {
        for org in orgs.iter().take(top) {
            let _ = writeln!(
                output,
                "- {}: {} executions across {} days",
                org.org_id, org.executions, org.active_days
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::three_day_dataset;

    #[test]
    fn orgs_rank_by_total_executions() {
        let totals = summarize_orgs(&three_day_dataset());
        assert_eq!(totals.len(), 2);
        // org-b: 12 + 9, org-a: 4 + 6 + 3
        assert_eq!(totals[0].org_id, "org-b");
        assert_eq!(totals[0].executions, 21);
        assert_eq!(totals[0].active_days, 2);
        assert_eq!(totals[1].executions, 13);
    }

    #[test]
    fn month_summary_matches_fixture() {
        let summary = summarize_month(&three_day_dataset());
        assert_eq!(summary.day_count, 3);
        // fixture totals are ten times the median: 60, 70, 50
        assert_eq!(summary.total_executions, 180.0);
        assert_eq!(summary.mean_daily_executions, 60.0);
        assert_eq!(summary.peak_day.map(|(_, t)| t), Some(70.0));
        assert_eq!(summary.median_of_medians, 6.0);
        assert_eq!(summary.distinct_orgs, 2);
        assert_eq!(summary.latest_moving_avg, Some(5.5));
    }

    #[test]
    fn report_lists_top_orgs() {
        let report = build_report(&three_day_dataset(), 1);
        assert!(report.contains("Generated for March 2024 (2024-03)"));
        assert!(report.contains("- org-b: 21 executions across 2 days"));
        assert!(!report.contains("org-a:"));
    }
}
