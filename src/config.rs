/// Tableau 10, assigned to organizations in first-appearance order.
pub const TABLEAU_10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Requested canvas width; clamped up to `min_width`.
    pub width: f64,
    pub min_width: f64,
    pub height: f64,
    pub margins: Margins,
    pub palette: Vec<String>,
    pub point_radius: f64,
    pub point_opacity: f64,
    pub grid_opacity: f64,
    pub time_padding: f64,
    pub value_padding: f64,
    pub box_fill_ratio: f64,
    pub min_box_width: f64,
    pub jitter_ratio: f64,
    pub value_ticks: usize,
    pub choreography: ChoreographyConfig,
}

impl ChartConfig {
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn canvas_width(&self) -> f64 {
        self.width.max(self.min_width)
    }

    pub fn plot_width(&self) -> f64 {
        (self.canvas_width() - self.margins.left - self.margins.right).max(1.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(1.0)
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            min_width: 800.0,
            height: 620.0,
            margins: Margins {
                top: 90.0,
                right: 90.0,
                bottom: 110.0,
                left: 90.0,
            },
            palette: TABLEAU_10.iter().map(|c| c.to_string()).collect(),
            point_radius: 3.0,
            point_opacity: 0.55,
            grid_opacity: 0.12,
            time_padding: 0.025,
            value_padding: 0.15,
            box_fill_ratio: 0.95,
            min_box_width: 3.0,
            jitter_ratio: 0.49,
            value_ticks: 8,
            choreography: ChoreographyConfig::default(),
        }
    }
}

/// Relative reveal timings in milliseconds. Budgets cap how long each stream
/// may take so the whole chart settles within a bounded window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoreographyConfig {
    pub day_stagger_ms: f64,
    pub day_stream_budget_ms: f64,
    pub whisker_ms: f64,
    pub box_offset_ms: f64,
    pub box_ms: f64,
    pub median_offset_ms: f64,
    pub median_ms: f64,
    pub points_start_ms: f64,
    pub point_stagger_ms: f64,
    pub point_stream_budget_ms: f64,
    pub point_ms: f64,
    pub trend_delay_ms: f64,
    pub trend_ms: f64,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            day_stagger_ms: 50.0,
            day_stream_budget_ms: 1500.0,
            whisker_ms: 300.0,
            box_offset_ms: 100.0,
            box_ms: 400.0,
            median_offset_ms: 200.0,
            median_ms: 300.0,
            points_start_ms: 500.0,
            point_stagger_ms: 2.0,
            point_stream_budget_ms: 2500.0,
            point_ms: 400.0,
            trend_delay_ms: 300.0,
            trend_ms: 2000.0,
        }
    }
}

impl ChoreographyConfig {
    /// Upper bound on when the last reveal finishes, whatever the mark counts.
    pub fn completion_bound_ms(&self) -> f64 {
        let days = self.day_stream_budget_ms
            + self.median_offset_ms.max(self.box_offset_ms)
            + self.whisker_ms.max(self.box_ms).max(self.median_ms);
        let points = self.points_start_ms + self.point_stream_budget_ms + self.point_ms;
        let trend = self.trend_delay_ms + self.trend_ms;
        days.max(points).max(trend)
    }
}
