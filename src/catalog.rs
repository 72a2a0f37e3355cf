use std::path::Path;

use anyhow::Context;

use crate::error::ChartError;
use crate::loader::{ResourceKind, RESOURCE_EXTENSION};
use crate::models::MonthKey;

/// Ordered, de-duplicated set of months that may be requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCatalog {
    months: Vec<MonthKey>,
}

impl MonthCatalog {
    pub fn new(mut months: Vec<MonthKey>) -> Self {
        months.sort();
        months.dedup();
        Self { months }
    }

    /// Months with both resources present in `dir`.
    pub fn discover(dir: &Path) -> anyhow::Result<Self> {
        let prefix = format!("{}_", ResourceKind::Aggregate.prefix());
        let suffix = format!(".{RESOURCE_EXTENSION}");
        let mut months = Vec::new();

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list data directory {}", dir.display()))?;
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(key) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
            else {
                continue;
            };
            let Ok(month) = key.parse::<MonthKey>() else {
                tracing::debug!(file = name, "skipping file with unparseable month");
                continue;
            };
            if dir.join(ResourceKind::OrgDaily.file_name(&month)).is_file() {
                months.push(month);
            } else {
                tracing::warn!(%month, "aggregate resource has no org resource, skipping");
            }
        }

        Ok(Self::new(months))
    }

    pub fn months(&self) -> &[MonthKey] {
        &self.months
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn first(&self) -> Option<MonthKey> {
        self.months.first().copied()
    }

    pub fn last(&self) -> Option<MonthKey> {
        self.months.last().copied()
    }

    pub fn position(&self, month: &MonthKey) -> Option<usize> {
        self.months.binary_search(month).ok()
    }

    pub fn require(&self, month: MonthKey) -> Result<MonthKey, ChartError> {
        self.position(&month)
            .map(|_| month)
            .ok_or(ChartError::UnknownMonth(month))
    }

    pub fn previous(&self, month: &MonthKey) -> Option<MonthKey> {
        let index = self.position(month)?;
        index.checked_sub(1).map(|i| self.months[i])
    }

    pub fn next(&self, month: &MonthKey) -> Option<MonthKey> {
        let index = self.position(month)?;
        self.months.get(index + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> MonthKey {
        value.parse().unwrap()
    }

    #[test]
    fn catalog_sorts_and_dedups() {
        let catalog = MonthCatalog::new(vec![key("2024-02"), key("2024-01"), key("2024-02")]);
        assert_eq!(catalog.months(), &[key("2024-01"), key("2024-02")]);
        assert_eq!(catalog.first(), Some(key("2024-01")));
        assert_eq!(catalog.last(), Some(key("2024-02")));
    }

    #[test]
    fn neighbours_stop_at_boundaries() {
        let catalog = MonthCatalog::new(vec![key("2024-01"), key("2024-02"), key("2024-03")]);
        assert_eq!(catalog.previous(&key("2024-01")), None);
        assert_eq!(catalog.next(&key("2024-03")), None);
        assert_eq!(catalog.next(&key("2024-01")), Some(key("2024-02")));
        assert_eq!(catalog.previous(&key("2024-03")), Some(key("2024-02")));
    }

    #[test]
    fn require_rejects_months_outside_catalog() {
        let catalog = MonthCatalog::new(vec![key("2024-01")]);
        assert!(catalog.require(key("2024-01")).is_ok());
        assert!(matches!(
            catalog.require(key("2023-12")),
            Err(ChartError::UnknownMonth(_))
        ));
    }

    #[test]
    fn discover_requires_both_resources() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "box_plot_2024-01.csv",
            "org_data_2024-01.csv",
            "box_plot_2024-02.csv",
            "box_plot_notes.csv",
            "readme.txt",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let catalog = MonthCatalog::discover(dir.path()).unwrap();
        assert_eq!(catalog.months(), &[key("2024-01")]);
    }
}
