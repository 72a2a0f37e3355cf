use chrono::NaiveDate;
use rand::Rng;

use crate::config::{ChartConfig, Margins};
use crate::models::{MonthDataset, MonthKey};
use crate::scales::Scales;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub plot_width: f64,
    pub plot_height: f64,
}

impl Frame {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            width: config.canvas_width(),
            height: config.height,
            margins: config.margins,
            plot_width: config.plot_width(),
            plot_height: config.plot_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub title: String,
    pub ticks: Vec<Tick>,
}

/// Five-number summary drawn for one day. Vertical positions are in plot
/// coordinates, so `whisker_top <= box_top <= median_y <= box_bottom <= whisker_bottom`
/// whenever the percentiles are ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxMark {
    pub day: usize,
    pub date: NaiveDate,
    pub center_x: f64,
    pub width: f64,
    pub whisker_top: f64,
    pub whisker_bottom: f64,
    pub box_top: f64,
    pub box_bottom: f64,
    pub median_y: f64,
    pub whisker_span: (f64, f64),
}

impl BoxMark {
    pub fn left(&self) -> f64 {
        self.center_x - self.width / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointMark {
    pub index: usize,
    pub org_id: String,
    pub date: NaiveDate,
    pub execution_count: u64,
    pub cx: f64,
    pub cy: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendVertex {
    pub date: NaiveDate,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPath {
    pub vertices: Vec<TrendVertex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendKind {
    TrendLine,
    InterquartileBox,
    Median,
    Whiskers,
    OrgPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub kind: LegendKind,
    pub label: &'static str,
}

pub static LEGEND: [LegendEntry; 5] = [
    LegendEntry {
        kind: LegendKind::TrendLine,
        label: "7-day moving average",
    },
    LegendEntry {
        kind: LegendKind::InterquartileBox,
        label: "IQR (p25 to p75)",
    },
    LegendEntry {
        kind: LegendKind::Median,
        label: "Median",
    },
    LegendEntry {
        kind: LegendKind::Whiskers,
        label: "Whiskers (p5 to p95)",
    },
    LegendEntry {
        kind: LegendKind::OrgPoint,
        label: "Org daily executions",
    },
];

/// The static end state of one month's chart, layers in drawing order.
#[derive(Debug, Clone)]
pub struct Composition {
    pub month: MonthKey,
    pub title: String,
    pub frame: Frame,
    pub grid: Vec<f64>,
    pub x_axis: Axis,
    pub left_axis: Axis,
    pub right_axis: Axis,
    pub slot_width: f64,
    pub boxes: Vec<BoxMark>,
    pub points: Vec<PointMark>,
    pub trend: Option<TrendPath>,
    pub legend: &'static [LegendEntry],
    pub point_radius: f64,
    pub point_opacity: f64,
    pub grid_opacity: f64,
}

pub fn compose<R>(
    config: &ChartConfig,
    dataset: &MonthDataset,
    scales: &Scales,
    rng: &mut R,
) -> Composition
where
    R: Rng,
{
    let frame = Frame::from_config(config);
    let slot_width = frame.plot_width / dataset.days.len().max(1) as f64;

    let left_ticks = scales.left.ticks(config.value_ticks);
    let grid = left_ticks.iter().map(|v| scales.left.map(*v)).collect();
    let left_axis = Axis {
        title: "Executions per organization".to_string(),
        ticks: value_ticks(&scales.left, &left_ticks, config.value_ticks),
    };
    let right_values = scales.right.ticks(config.value_ticks);
    let right_axis = Axis {
        title: "7-day moving average (total executions)".to_string(),
        ticks: value_ticks(&scales.right, &right_values, config.value_ticks),
    };
    let x_axis = Axis {
        title: "Date".to_string(),
        ticks: dataset
            .days
            .iter()
            .map(|day| Tick {
                position: scales.time.map(day.date),
                label: day.date.format("%b %-d").to_string(),
            })
            .collect(),
    };

    Composition {
        month: dataset.month,
        title: format!("Workflow executions per organization, {}", dataset.month.label()),
        frame,
        grid,
        x_axis,
        left_axis,
        right_axis,
        slot_width,
        boxes: box_layer(config, dataset, scales, slot_width),
        points: jitter_layer(config, dataset, scales, slot_width, rng),
        trend: trend_layer(dataset, scales),
        legend: &LEGEND,
        point_radius: config.point_radius,
        point_opacity: config.point_opacity,
        grid_opacity: config.grid_opacity,
    }
}

fn value_ticks(scale: &crate::scales::LinearScale, values: &[f64], count: usize) -> Vec<Tick> {
    values
        .iter()
        .map(|value| Tick {
            position: scale.map(*value),
            label: scale.tick_label(*value, count),
        })
        .collect()
}

fn box_layer(
    config: &ChartConfig,
    dataset: &MonthDataset,
    scales: &Scales,
    slot_width: f64,
) -> Vec<BoxMark> {
    let width = (slot_width * config.box_fill_ratio).max(config.min_box_width);
    dataset
        .days
        .iter()
        .enumerate()
        .map(|(day, aggregate)| BoxMark {
            day,
            date: aggregate.date,
            center_x: scales.time.map(aggregate.date),
            width,
            whisker_top: scales.left.map(aggregate.p95),
            whisker_bottom: scales.left.map(aggregate.p5),
            box_top: scales.left.map(aggregate.p75),
            box_bottom: scales.left.map(aggregate.p25),
            median_y: scales.left.map(aggregate.median),
            whisker_span: (aggregate.p5, aggregate.p95),
        })
        .collect()
}

fn jitter_layer<R>(
    config: &ChartConfig,
    dataset: &MonthDataset,
    scales: &Scales,
    slot_width: f64,
    rng: &mut R,
) -> Vec<PointMark>
where
    R: Rng,
{
    let spread = slot_width * config.jitter_ratio;
    dataset
        .orgs
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let offset = if spread > 0.0 {
                rng.gen_range(-spread..=spread)
            } else {
                0.0
            };
            PointMark {
                index,
                org_id: record.org_id.clone(),
                date: record.date,
                execution_count: record.execution_count,
                cx: scales.time.map(record.date) + offset,
                cy: scales.left.map(record.execution_count as f64),
                color: scales.color.color(&record.org_id).to_string(),
            }
        })
        .collect()
}

fn trend_layer(dataset: &MonthDataset, scales: &Scales) -> Option<TrendPath> {
    if dataset.days.len() < 2 {
        return None;
    }
    let vertices = dataset
        .days
        .iter()
        .map(|day| TrendVertex {
            date: day.date,
            value: day.moving_avg_7day,
            x: scales.time.map(day.date),
            y: scales.right.map(day.moving_avg_7day),
        })
        .collect();
    Some(TrendPath { vertices })
}
