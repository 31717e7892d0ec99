//! SVG line charts of one latency phase

use super::escape;
use crate::{stats::SeriesSummary, types::Phase};
use std::fmt::Write as _;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICKS: usize = 5;

/// Value range mapped onto one chart axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    min: f64,
    max: f64,
}

impl Axis {
    fn spanning(values: impl Iterator<Item = f64>, include_zero: bool) -> Self {
        let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !min.is_finite() || !max.is_finite() {
            return Self { min: 0.0, max: 1.0 };
        }
        if include_zero {
            min = min.min(0.0);
        }
        if max - min < f64::EPSILON {
            min -= 1.0;
            max += 1.0;
        }
        Self { min, max }
    }

    /// Fraction of the axis covered up to `value`
    fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    fn tick(&self, index: usize) -> f64 {
        self.min + (self.max - self.min) * index as f64 / TICKS as f64
    }
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// Render `points` (iteration, latency) as a standalone SVG document.
///
/// `summary` describes the full series, not the plotted points, and is shown
/// in a text box in the upper right corner.
pub fn render_chart(phase: Phase, points: &[(f64, f64)], summary: &SeriesSummary) -> String {
    let x_axis = Axis::spanning(points.iter().map(|(x, _)| *x), false);
    let y_axis = Axis::spanning(points.iter().map(|(_, y)| *y), true);

    let to_x = |x: f64| MARGIN_LEFT + x_axis.fraction(x) * plot_width();
    let to_y = |y: f64| MARGIN_TOP + (1.0 - y_axis.fraction(y)) * plot_height();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="30" text-anchor="middle" font-size="20">{}</text>"#,
        WIDTH / 2.0,
        escape(phase.chart_title())
    );

    // Axes
    let bottom = MARGIN_TOP + plot_height();
    let right = MARGIN_LEFT + plot_width();
    let _ = writeln!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        r = right,
        t = MARGIN_TOP,
        b = bottom
    );

    for i in 0..=TICKS {
        let xv = x_axis.tick(i);
        let yv = y_axis.tick(i);
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11">{:.0}</text>"#,
            to_x(xv),
            bottom + 18.0,
            xv
        );
        let _ = writeln!(
            svg,
            r##"<line x1="{l}" y1="{y:.1}" x2="{r}" y2="{y:.1}" stroke="#dddddd"/><text x="{tx}" y="{ty:.1}" text-anchor="end" font-size="11">{v:.1}</text>"##,
            l = MARGIN_LEFT,
            r = right,
            y = to_y(yv),
            tx = MARGIN_LEFT - 6.0,
            ty = to_y(yv) + 4.0,
            v = yv
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="13">Iteration</text>"#,
        MARGIN_LEFT + plot_width() / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{y}" text-anchor="middle" font-size="13" transform="rotate(-90 18 {y})">Time (ms)</text>"#,
        y = MARGIN_TOP + plot_height() / 2.0
    );

    if !points.is_empty() {
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", to_x(*x), to_y(*y)))
            .collect();
        let _ = writeln!(
            svg,
            r##"<polyline fill="none" stroke="#1f77b4" stroke-width="1.5" points="{}"/>"##,
            coords.join(" ")
        );
    }

    write_stats_box(&mut svg, summary);
    svg.push_str("</svg>\n");
    svg
}

fn write_stats_box(svg: &mut String, summary: &SeriesSummary) {
    let lines = [
        format!("Minimum: {:.3} ms", summary.min),
        format!("Maximum: {:.3} ms", summary.max),
        format!("Mean: {:.3} ms", summary.mean),
        format!("Total requests: {}", summary.count),
        format!("Requests per point: {}", summary.requests_per_point),
    ];

    let box_width = 190.0;
    let x = WIDTH - MARGIN_RIGHT - box_width - 10.0;
    let y = MARGIN_TOP + 10.0;

    let _ = writeln!(
        svg,
        r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#f5deb3" fill-opacity="0.6" stroke="#999999" rx="4"/>"##,
        x,
        y,
        box_width,
        lines.len() as f64 * 16.0 + 10.0
    );
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
            x + 8.0,
            y + 18.0 + i as f64 * 16.0,
            escape(line)
        );
    }
}
