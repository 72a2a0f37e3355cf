use std::fmt::Write;

use crate::choreography::Reveal;
use crate::layers::{Composition, Frame, LegendKind};
use crate::models::MonthKey;
use crate::pipeline::Chart;

const BOX_FILL: &str = "#cfe0f1";
const BOX_STROKE: &str = "#4e79a7";
const WHISKER_STROKE: &str = "#56606b";
const MEDIAN_STROKE: &str = "#1f2d3d";
const TREND_STROKE: &str = "#d1495b";
const AXIS_STROKE: &str = "#6b7280";
const TEXT_FILL: &str = "#1f2937";

/// Keyframes animate toward the end-state attributes.
const STYLE: &str = r#"  <style>
    @keyframes grow-y { from { transform: scaleY(0); } to { transform: scaleY(1); } }
    @keyframes grow-x { from { transform: scaleX(0); } to { transform: scaleX(1); } }
    @keyframes fade-in { from { opacity: 0; } to { opacity: 1; } }
    @keyframes draw-line { from { stroke-dashoffset: 1; } to { stroke-dashoffset: 0; } }
    .grow { transform-box: fill-box; transform-origin: center; }
    .tick-label { font-size: 11px; fill: #4b5563; }
    .axis-title { font-size: 13px; fill: #1f2937; }
    .chart-title { font-size: 18px; font-weight: 600; fill: #111827; }
    .legend-label { font-size: 12px; fill: #374151; }
  </style>"#;

pub fn render(chart: &Chart) -> String {
    let composition = &chart.composition;
    let frame = composition.frame;
    let mut output = String::new();

    open_document(&mut output, &frame);
    let _ = writeln!(
        output,
        r#"  <text class="chart-title" x="{:.2}" y="28" text-anchor="middle">{}</text>"#,
        frame.width / 2.0,
        escape(&composition.title)
    );
    let _ = writeln!(
        output,
        r#"  <g class="plot" data-month="{}" transform="translate({:.2},{:.2})">"#,
        composition.month, frame.margins.left, frame.margins.top
    );
    let _ = writeln!(
        output,
        r#"    <defs><clipPath id="plot-area"><rect width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
        frame.plot_width, frame.plot_height
    );

    write_grid_and_axes(&mut output, composition);
    write_boxes(&mut output, chart);
    write_points(&mut output, chart);
    write_trend(&mut output, chart);

    let _ = writeln!(output, "  </g>");
    write_axis_titles(&mut output, composition);
    write_legend(&mut output, composition);
    let _ = writeln!(output, "</svg>");
    output
}

/// Blank chart area carrying only the failure message for `month`.
pub fn render_error(frame: &Frame, month: MonthKey, message: &str) -> String {
    let mut output = String::new();
    open_document(&mut output, frame);
    let _ = writeln!(
        output,
        r#"  <text class="chart-title" x="{:.2}" y="{:.2}" text-anchor="middle">Could not load data for {}</text>"#,
        frame.width / 2.0,
        frame.height / 2.0 - 12.0,
        escape(&month.label())
    );
    let _ = writeln!(
        output,
        r#"  <text class="legend-label" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
        frame.width / 2.0,
        frame.height / 2.0 + 14.0,
        escape(message)
    );
    let _ = writeln!(output, "</svg>");
    output
}

fn open_document(output: &mut String, frame: &Frame) {
    let _ = writeln!(
        output,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="system-ui, sans-serif">"#,
        w = frame.width,
        h = frame.height
    );
    let _ = writeln!(output, "{STYLE}");
    let _ = writeln!(output, r#"  <rect width="100%" height="100%" fill="white"/>"#);
}

fn animation(name: &str, reveal: &Reveal) -> String {
    format!(
        "animation: {name} {:.0}ms {} {:.0}ms both",
        reveal.duration_ms,
        reveal.easing.css(),
        reveal.delay_ms
    )
}

fn write_grid_and_axes(output: &mut String, composition: &Composition) {
    let frame = composition.frame;

    let _ = writeln!(
        output,
        r#"    <g class="grid" stroke="{AXIS_STROKE}" stroke-opacity="{:.2}">"#,
        composition.grid_opacity
    );
    for y in &composition.grid {
        let _ = writeln!(
            output,
            r#"      <line x1="0" x2="{:.2}" y1="{y:.2}" y2="{y:.2}"/>"#,
            frame.plot_width
        );
    }
    let _ = writeln!(output, "    </g>");

    let _ = writeln!(
        output,
        r#"    <g class="axis x-axis" transform="translate(0,{:.2})">"#,
        frame.plot_height
    );
    let _ = writeln!(
        output,
        r#"      <line x1="0" x2="{:.2}" stroke="{AXIS_STROKE}"/>"#,
        frame.plot_width
    );
    for tick in &composition.x_axis.ticks {
        let _ = writeln!(
            output,
            r#"      <line x1="{x:.2}" x2="{x:.2}" y2="6" stroke="{AXIS_STROKE}"/>"#,
            x = tick.position
        );
        let _ = writeln!(
            output,
            r#"      <text class="tick-label" text-anchor="end" transform="translate({:.2},12) rotate(-45)">{}</text>"#,
            tick.position,
            escape(&tick.label)
        );
    }
    let _ = writeln!(output, "    </g>");

    let _ = writeln!(output, r#"    <g class="axis y-left">"#);
    let _ = writeln!(
        output,
        r#"      <line y1="0" y2="{:.2}" stroke="{AXIS_STROKE}"/>"#,
        frame.plot_height
    );
    for tick in &composition.left_axis.ticks {
        let _ = writeln!(
            output,
            r#"      <line x1="-6" x2="0" y1="{y:.2}" y2="{y:.2}" stroke="{AXIS_STROKE}"/>"#,
            y = tick.position
        );
        let _ = writeln!(
            output,
            r#"      <text class="tick-label" x="-9" y="{:.2}" dy="0.32em" text-anchor="end">{}</text>"#,
            tick.position,
            escape(&tick.label)
        );
    }
    let _ = writeln!(output, "    </g>");

    let _ = writeln!(
        output,
        r#"    <g class="axis y-right" transform="translate({:.2},0)">"#,
        frame.plot_width
    );
    let _ = writeln!(
        output,
        r#"      <line y1="0" y2="{:.2}" stroke="{TREND_STROKE}"/>"#,
        frame.plot_height
    );
    for tick in &composition.right_axis.ticks {
        let _ = writeln!(
            output,
            r#"      <line x1="0" x2="6" y1="{y:.2}" y2="{y:.2}" stroke="{TREND_STROKE}"/>"#,
            y = tick.position
        );
        let _ = writeln!(
            output,
            r#"      <text class="tick-label" x="9" y="{:.2}" dy="0.32em">{}</text>"#,
            tick.position,
            escape(&tick.label)
        );
    }
    let _ = writeln!(output, "    </g>");
}

fn write_boxes(output: &mut String, chart: &Chart) {
    let _ = writeln!(output, r#"    <g class="boxes">"#);
    for (mark, reveal) in chart.composition.boxes.iter().zip(&chart.schedule.days) {
        let _ = writeln!(
            output,
            r#"      <g class="day" data-day="{}" data-date="{}"><title>{}: p5 {} to p95 {}</title>"#,
            mark.day, mark.date, mark.date, mark.whisker_span.0, mark.whisker_span.1
        );
        let _ = writeln!(
            output,
            r#"        <line class="whisker grow" x1="{x:.2}" x2="{x:.2}" y1="{:.2}" y2="{:.2}" stroke="{WHISKER_STROKE}" stroke-width="1.5" style="{}"/>"#,
            mark.whisker_top,
            mark.whisker_bottom,
            animation("grow-y", &reveal.whisker),
            x = mark.center_x
        );
        let _ = writeln!(
            output,
            r#"        <rect class="iqr grow" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{BOX_FILL}" stroke="{BOX_STROKE}" style="{}"/>"#,
            mark.left(),
            mark.box_top,
            mark.width,
            (mark.box_bottom - mark.box_top).max(0.0),
            animation("grow-y", &reveal.body)
        );
        let _ = writeln!(
            output,
            r#"        <line class="median grow" x1="{:.2}" x2="{:.2}" y1="{y:.2}" y2="{y:.2}" stroke="{MEDIAN_STROKE}" stroke-width="2" style="{}"/>"#,
            mark.left(),
            mark.left() + mark.width,
            animation("grow-x", &reveal.median),
            y = mark.median_y
        );
        let _ = writeln!(output, "      </g>");
    }
    let _ = writeln!(output, "    </g>");
}

fn write_points(output: &mut String, chart: &Chart) {
    let composition = &chart.composition;
    // Org rows dated outside the aggregate days can map past the plot edge.
    let _ = writeln!(
        output,
        r#"    <g class="points" clip-path="url(#plot-area)" data-slot-width="{:.2}">"#,
        composition.slot_width
    );
    for (point, reveal) in composition.points.iter().zip(&chart.schedule.points) {
        let _ = writeln!(
            output,
            r#"      <circle class="point" data-index="{}" cx="{:.2}" cy="{:.2}" r="{:.1}" fill="{}" fill-opacity="{:.2}" style="{}"><title>{} on {}: {}</title></circle>"#,
            point.index,
            point.cx,
            point.cy,
            composition.point_radius,
            point.color,
            composition.point_opacity,
            animation("fade-in", reveal),
            escape(&point.org_id),
            point.date,
            point.execution_count
        );
    }
    let _ = writeln!(output, "    </g>");
}

fn write_trend(output: &mut String, chart: &Chart) {
    let (Some(trend), Some(reveal)) = (&chart.composition.trend, &chart.schedule.trend) else {
        return;
    };
    let mut path = String::new();
    let mut values = Vec::with_capacity(trend.vertices.len());
    for (i, vertex) in trend.vertices.iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        let _ = write!(path, "{command}{:.2},{:.2} ", vertex.x, vertex.y);
        values.push(format!("{}={}", vertex.date, vertex.value));
    }
    let _ = writeln!(
        output,
        r#"    <path class="trend" d="{}" data-values="{}" fill="none" stroke="{TREND_STROKE}" stroke-width="2.5" pathLength="1" stroke-dasharray="1" style="{}"/>"#,
        path.trim_end(),
        values.join(" "),
        animation("draw-line", reveal)
    );
}

fn write_axis_titles(output: &mut String, composition: &Composition) {
    let frame = composition.frame;
    let plot_mid_y = frame.margins.top + frame.plot_height / 2.0;
    let _ = writeln!(
        output,
        r#"  <text class="axis-title" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
        frame.margins.left + frame.plot_width / 2.0,
        frame.height - 12.0,
        escape(&composition.x_axis.title)
    );
    let _ = writeln!(
        output,
        r#"  <text class="axis-title" text-anchor="middle" transform="translate(22,{:.2}) rotate(-90)">{}</text>"#,
        plot_mid_y,
        escape(&composition.left_axis.title)
    );
    let _ = writeln!(
        output,
        r#"  <text class="axis-title" text-anchor="middle" fill="{TREND_STROKE}" transform="translate({:.2},{:.2}) rotate(90)">{}</text>"#,
        frame.width - 22.0,
        plot_mid_y,
        escape(&composition.right_axis.title)
    );
}

fn write_legend(output: &mut String, composition: &Composition) {
    let frame = composition.frame;
    let spacing = frame.plot_width / composition.legend.len().max(1) as f64;
    let y = frame.margins.top - 36.0;
    let _ = writeln!(
        output,
        r#"  <g class="legend" transform="translate({:.2},{y:.2})">"#,
        frame.margins.left
    );
    for (i, entry) in composition.legend.iter().enumerate() {
        let x = i as f64 * spacing;
        let swatch = match entry.kind {
            LegendKind::TrendLine => format!(
                r#"<line x1="0" x2="18" y1="0" y2="0" stroke="{TREND_STROKE}" stroke-width="2.5"/>"#
            ),
            LegendKind::InterquartileBox => format!(
                r#"<rect x="2" y="-6" width="14" height="12" fill="{BOX_FILL}" stroke="{BOX_STROKE}"/>"#
            ),
            LegendKind::Median => format!(
                r#"<line x1="0" x2="18" y1="0" y2="0" stroke="{MEDIAN_STROKE}" stroke-width="2"/>"#
            ),
            LegendKind::Whiskers => format!(
                r#"<line x1="9" x2="9" y1="-7" y2="7" stroke="{WHISKER_STROKE}" stroke-width="1.5"/>"#
            ),
            LegendKind::OrgPoint => format!(
                r#"<circle cx="9" cy="0" r="{:.1}" fill="{BOX_STROKE}" fill-opacity="{:.2}"/>"#,
                composition.point_radius, composition.point_opacity
            ),
        };
        let _ = writeln!(
            output,
            r#"    <g transform="translate({x:.2},0)">{swatch}<text class="legend-label" x="24" y="0" dy="0.32em" fill="{TEXT_FILL}">{}</text></g>"#,
            escape(entry.label)
        );
    }
    let _ = writeln!(output, "  </g>");
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
