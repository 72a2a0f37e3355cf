use crate::config::ChoreographyConfig;
use crate::layers::Composition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadOut,
    CubicInOut,
}

impl Easing {
    pub fn css(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::QuadOut => "cubic-bezier(0.25, 0.46, 0.45, 0.94)",
            Easing::CubicInOut => "cubic-bezier(0.645, 0.045, 0.355, 1)",
        }
    }
}

/// When one mark starts revealing and how long it takes, relative to the
/// moment the chart is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    pub delay_ms: f64,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Reveal {
    pub fn end_ms(&self) -> f64 {
        self.delay_ms + self.duration_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayReveal {
    pub whisker: Reveal,
    pub body: Reveal,
    pub median: Reveal,
}

/// Timing for every mark of a composition, indexed like its layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub days: Vec<DayReveal>,
    pub points: Vec<Reveal>,
    pub trend: Option<Reveal>,
}

impl Schedule {
    pub fn total_ms(&self) -> f64 {
        let days = self
            .days
            .iter()
            .flat_map(|d| [d.whisker, d.body, d.median])
            .map(|r| r.end_ms());
        let points = self.points.iter().map(Reveal::end_ms);
        let trend = self.trend.iter().map(Reveal::end_ms);
        days.chain(points).chain(trend).fold(0.0, f64::max)
    }
}

pub fn choreograph(config: &ChoreographyConfig, composition: &Composition) -> Schedule {
    let day_count = composition.boxes.len();
    let point_count = composition.points.len();

    // Staggers shrink for long streams so the whole reveal stays bounded.
    let day_stagger = config
        .day_stagger_ms
        .min(config.day_stream_budget_ms / day_count.max(1) as f64);
    let mut point_stagger = config
        .point_stagger_ms
        .min(config.point_stream_budget_ms / point_count.max(1) as f64);

    let days: Vec<DayReveal> = (0..day_count)
        .map(|day| {
            let base = day as f64 * day_stagger;
            DayReveal {
                whisker: Reveal {
                    delay_ms: base,
                    duration_ms: config.whisker_ms,
                    easing: Easing::QuadOut,
                },
                body: Reveal {
                    delay_ms: base + config.box_offset_ms,
                    duration_ms: config.box_ms,
                    easing: Easing::QuadOut,
                },
                median: Reveal {
                    delay_ms: base + config.median_offset_ms,
                    duration_ms: config.median_ms,
                    easing: Easing::QuadOut,
                },
            }
        })
        .collect();

    // Points join while the last boxes are still arriving, and the stream
    // ends no earlier than the last median.
    let last_body = days.last().map(|d| d.body.delay_ms).unwrap_or(0.0);
    let last_median_end = days.last().map(|d| d.median.end_ms()).unwrap_or(0.0);
    let mut points_start = config.points_start_ms.min(last_body);
    let tail_ms = last_median_end - points_start - config.point_ms;
    if point_count > 1 {
        let steps = (point_count - 1) as f64;
        let stretched = (tail_ms / steps).min(config.point_stream_budget_ms / steps);
        point_stagger = point_stagger.max(stretched);
    } else if tail_ms > 0.0 {
        points_start += tail_ms;
    }
    let points = (0..point_count)
        .map(|index| Reveal {
            delay_ms: points_start + index as f64 * point_stagger,
            duration_ms: config.point_ms,
            easing: Easing::Linear,
        })
        .collect();

    let trend = composition.trend.as_ref().map(|_| Reveal {
        delay_ms: config.trend_delay_ms,
        duration_ms: config.trend_ms,
        easing: Easing::CubicInOut,
    });

    Schedule {
        days,
        points,
        trend,
    }
}
