use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::config::ChartConfig;
use crate::models::MonthDataset;

/// Continuous linear mapping from a numeric domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Round-numbered tick values inside the domain, roughly `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        if !(hi > lo) {
            return vec![lo];
        }
        let step = tick_step(lo, hi, count);
        let start = (lo / step).ceil() as i64;
        let stop = (hi / step).floor() as i64;
        (start..=stop).map(|i| i as f64 * step).collect()
    }

    pub fn tick_label(&self, value: f64, count: usize) -> String {
        let (lo, hi) = ordered(self.domain);
        let step = if hi > lo { tick_step(lo, hi, count) } else { 1.0 };
        let decimals = if step >= 1.0 {
            0
        } else {
            (-step.log10()).ceil() as usize
        };
        format!("{value:.decimals$}")
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Pads `[lo, hi]` by `ratio` of its span on each side, never below zero.
pub fn padded_domain(lo: f64, hi: f64, ratio: f64) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span > 0.0 { span * ratio } else { hi.abs().max(1.0) * ratio };
    ((lo - pad).max(0.0), hi + pad)
}

/// Calendar dates mapped through day ordinals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    pub fn map(&self, date: NaiveDate) -> f64 {
        self.inner.map(day_number(date))
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Stable orgId → palette colour, assigned in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    order: Vec<String>,
    index: HashMap<String, usize>,
    palette: Vec<String>,
}

impl ColorScale {
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>, palette: &[String]) -> Self {
        let mut order = Vec::new();
        let mut index = HashMap::new();
        for id in ids {
            if !index.contains_key(id) {
                index.insert(id.to_string(), order.len());
                order.push(id.to_string());
            }
        }
        Self {
            order,
            index,
            palette: palette.to_vec(),
        }
    }

    pub fn color(&self, org_id: &str) -> &str {
        let slot = self.index.get(org_id).copied().unwrap_or(0);
        self.palette
            .get(slot % self.palette.len().max(1))
            .map(String::as_str)
            .unwrap_or("#888888")
    }

    pub fn domain(&self) -> &[String] {
        &self.order
    }
}

#[derive(Debug, Clone)]
pub struct Scales {
    pub time: TimeScale,
    pub left: LinearScale,
    pub right: LinearScale,
    pub color: ColorScale,
}

impl Scales {
    /// Derives all four mappings for one month. Plot coordinates are relative
    /// to the plot origin, y grows downward.
    pub fn build(config: &ChartConfig, dataset: &MonthDataset) -> Self {
        let width = config.plot_width();
        let height = config.plot_height();

        let (first, last) = min_max(dataset.days.iter().map(|d| day_number(d.date)));
        let time_pad = (last - first) * config.time_padding;
        let time = TimeScale {
            inner: LinearScale::new((first - time_pad, last + time_pad), (0.0, width)),
        };

        let (low_pct, _) = min_max(dataset.days.iter().map(|d| d.p5));
        let (_, high_pct) = min_max(dataset.days.iter().map(|d| d.p95));
        let (low, high) = if dataset.orgs.is_empty() {
            (low_pct, high_pct)
        } else {
            let (low_org, high_org) =
                min_max(dataset.orgs.iter().map(|r| r.execution_count as f64));
            (low_pct.min(low_org), high_pct.max(high_org))
        };
        let left = LinearScale::new(
            padded_domain(low, high, config.value_padding),
            (height, 0.0),
        );

        let (low_avg, high_avg) = min_max(dataset.days.iter().map(|d| d.moving_avg_7day));
        let right = LinearScale::new(
            padded_domain(low_avg, high_avg, config.value_padding),
            (height, 0.0),
        );

        let color = ColorScale::from_ids(
            dataset.orgs.iter().map(|r| r.org_id.as_str()),
            &config.palette,
        );

        Self {
            time,
            left,
            right,
            color,
        }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{aggregate_csv, org_csv, three_day_dataset};
    use crate::loader::parse_month;
    use crate::models::MonthKey;
    use proptest::prelude::*;

    #[test]
    fn linear_scale_maps_endpoints() {
        let scale = LinearScale::new((0.0, 10.0), (100.0, 0.0));
        assert_eq!(scale.map(0.0), 100.0);
        assert_eq!(scale.map(10.0), 0.0);
        assert_eq!(scale.map(5.0), 50.0);
    }

    #[test]
    fn degenerate_domain_maps_to_range_midpoint() {
        let scale = LinearScale::new((3.0, 3.0), (0.0, 200.0));
        assert_eq!(scale.map(3.0), 100.0);
    }

    #[test]
    fn ticks_use_round_steps() {
        let scale = LinearScale::new((0.0, 97.0), (0.0, 1.0));
        assert_eq!(
            scale.ticks(10),
            vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0]
        );
        assert_eq!(scale.tick_label(20.0, 10), "20");
        let small = LinearScale::new((0.0, 1.0), (0.0, 1.0));
        assert_eq!(small.tick_label(0.2, 5), "0.2");
    }

    #[test]
    fn time_domain_is_padded_by_two_and_a_half_percent() {
        let dataset = three_day_dataset();
        let scales = Scales::build(&ChartConfig::default(), &dataset);
        let (lo, hi) = scales.time.inner.domain;
        let first = day_number(dataset.days[0].date);
        assert!((lo - (first - 0.05)).abs() < 1e-9);
        assert!((hi - (first + 2.05)).abs() < 1e-9);
        // first and last day sit inside the plot, not on its edge
        let width = ChartConfig::default().plot_width();
        assert!(scales.time.map(dataset.days[0].date) > 0.0);
        assert!(scales.time.map(dataset.days[2].date) < width);
    }

    #[test]
    fn left_domain_covers_percentiles_and_points() {
        let dataset = three_day_dataset();
        let scales = Scales::build(&ChartConfig::default(), &dataset);
        // raw range is [1, 16], span 15, padded by 2.25 and floored at 0
        assert_eq!(scales.left.domain.0, 0.0);
        assert!((scales.left.domain.1 - 18.25).abs() < 1e-9);
    }

    #[test]
    fn right_domain_is_independent_of_left() {
        let dataset = three_day_dataset();
        let scales = Scales::build(&ChartConfig::default(), &dataset);
        // moving average spans [5, 6]
        assert!((scales.right.domain.0 - 4.85).abs() < 1e-9);
        assert!((scales.right.domain.1 - 6.15).abs() < 1e-9);
    }

    #[test]
    fn colors_follow_first_appearance_and_cycle() {
        let palette: Vec<String> = ["#a", "#b"].iter().map(|c| c.to_string()).collect();
        let scale = ColorScale::from_ids(["z", "y", "z", "x"], &palette);
        assert_eq!(scale.domain(), &["z", "y", "x"]);
        assert_eq!(scale.color("z"), "#a");
        assert_eq!(scale.color("y"), "#b");
        assert_eq!(scale.color("x"), "#a");
    }

    #[test]
    fn color_assignment_is_stable_across_builds() {
        let dataset = three_day_dataset();
        let config = ChartConfig::default();
        let first = Scales::build(&config, &dataset);
        let second = Scales::build(&config, &dataset);
        for id in first.color.domain() {
            assert_eq!(first.color.color(id), second.color.color(id));
        }
        assert_eq!(first.color.domain(), second.color.domain());
    }

    proptest! {
        #[test]
        fn built_left_domain_never_goes_below_zero(
            p5 in 0.0f64..1e4,
            widths in proptest::collection::vec(0.0f64..1e3, 4),
            counts in proptest::collection::vec(0u64..50_000, 0..20),
        ) {
            let p25 = p5 + widths[0];
            let median = p25 + widths[1];
            let p75 = median + widths[2];
            let p95 = p75 + widths[3];
            let month: MonthKey = "2024-03".parse().unwrap();
            let org_rows: Vec<(&str, &str, u64)> =
                counts.iter().map(|count| ("2024-03-02", "org", *count)).collect();
            let dataset = parse_month(
                month,
                &aggregate_csv(&[
                    ("2024-03-01", p5, p25, median, p75, p95, median),
                    ("2024-03-02", p5, p25, median, p75, p95, median),
                ]),
                &org_csv(&org_rows),
            )
            .unwrap();
            let scales = Scales::build(&ChartConfig::default(), &dataset);
            prop_assert!(scales.left.domain.0 >= 0.0);
            prop_assert!(scales.left.domain.1 >= p95);
            prop_assert!(scales.right.domain.0 >= 0.0);
        }

        #[test]
        fn padded_lower_bound_is_never_negative(
            lo in 0.0f64..1e6,
            span in 0.0f64..1e6,
        ) {
            let (low, high) = padded_domain(lo, lo + span, 0.15);
            prop_assert!(low >= 0.0);
            prop_assert!(high >= lo + span);
        }
    }
}
