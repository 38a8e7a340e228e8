//! SVG chart rendering.

use crate::domain::chart::{ChartData, ChartKind, chart_data};
use crate::domain::error::SimError;
use crate::domain::export::MergedResultView;
use crate::ports::chart_port::ChartPort;
use std::fmt::Write;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const PADDING: f64 = 70.0;

/// Stroke and fill per series, in plotting order.
const LINE_COLORS: [&str; 3] = ["rgb(75,0,130)", "rgb(60,179,113)", "rgb(255,99,71)"];
const AREA_COLORS: [&str; 3] = [
    "rgba(100,149,237,0.5)",
    "rgba(60,179,113,0.5)",
    "rgba(255,99,71,0.5)",
];

pub struct SvgChartAdapter;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

struct Scale {
    min: f64,
    scale_x: f64,
    scale_y: f64,
}

impl Scale {
    fn new(data: &ChartData) -> Self {
        let values = data.series.iter().flat_map(|s| s.values.iter().copied());
        let (mut min, mut max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !min.is_finite() {
            (min, max) = (0.0, 0.0);
        }
        // Area charts fill down to zero.
        if data.kind == ChartKind::Area {
            min = min.min(0.0);
        }

        let plot_width = WIDTH - 2.0 * PADDING;
        let plot_height = HEIGHT - 2.0 * PADDING;
        let range = max - min;
        let points = data.categories.len();
        Self {
            min,
            scale_x: if points > 1 {
                plot_width / (points - 1) as f64
            } else {
                0.0
            },
            scale_y: if range > 0.0 {
                plot_height / range
            } else {
                1.0
            },
        }
    }

    fn x(&self, i: usize) -> f64 {
        PADDING + i as f64 * self.scale_x
    }

    fn y(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value } else { self.min };
        HEIGHT - PADDING - (value - self.min) * self.scale_y
    }
}

/// Render prepared chart data as a standalone SVG document.
pub fn render_svg(data: &ChartData) -> String {
    let scale = Scale::new(data);
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect width="{WIDTH:.0}" height="{HEIGHT:.0}" fill="white"/>"#
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="30" text-anchor="middle" font-family="Arial" font-size="20">{}</text>"#,
        WIDTH / 2.0,
        escape_xml(data.title)
    );

    // Axes
    let _ = writeln!(
        svg,
        r#"  <line x1="{PADDING:.1}" y1="{PADDING:.1}" x2="{PADDING:.1}" y2="{:.1}" stroke="gray"/>"#,
        HEIGHT - PADDING
    );
    let _ = writeln!(
        svg,
        r#"  <line x1="{PADDING:.1}" y1="{0:.1}" x2="{1:.1}" y2="{0:.1}" stroke="gray"/>"#,
        HEIGHT - PADDING,
        WIDTH - PADDING
    );

    for (i, label) in data.categories.iter().enumerate() {
        let x = scale.x(i);
        let y = HEIGHT - PADDING + 16.0;
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{y:.1}" transform="rotate(-45 {x:.1} {y:.1})" text-anchor="end" font-family="Arial" font-size="12">{}</text>"#,
            escape_xml(label)
        );
    }

    for (index, series) in data.series.iter().enumerate() {
        let points: Vec<String> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", scale.x(i), scale.y(*v)))
            .collect();
        if points.is_empty() {
            continue;
        }

        match data.kind {
            ChartKind::Line => {
                let color = LINE_COLORS[index % LINE_COLORS.len()];
                let _ = writeln!(
                    svg,
                    r#"  <polyline fill="none" stroke="{color}" stroke-width="5" points="{}"/>"#,
                    points.join(" ")
                );
                for (i, v) in series.values.iter().enumerate() {
                    let _ = writeln!(
                        svg,
                        r#"  <circle cx="{:.1}" cy="{:.1}" r="4" fill="{color}"/>"#,
                        scale.x(i),
                        scale.y(*v)
                    );
                }
            }
            ChartKind::Area => {
                let color = AREA_COLORS[index % AREA_COLORS.len()];
                let baseline = scale.y(0.0);
                let last_x = scale.x(series.values.len() - 1);
                let _ = writeln!(
                    svg,
                    r#"  <polygon fill="{color}" stroke="{color}" stroke-width="2" points="{PADDING:.1},{baseline:.1} {} {last_x:.1},{baseline:.1}"/>"#,
                    points.join(" ")
                );
            }
        }

        let legend_y = 50.0 + index as f64 * 18.0;
        let swatch = match data.kind {
            ChartKind::Line => LINE_COLORS[index % LINE_COLORS.len()],
            ChartKind::Area => AREA_COLORS[index % AREA_COLORS.len()],
        };
        let _ = writeln!(
            svg,
            r#"  <rect x="{:.1}" y="{:.1}" width="12" height="12" fill="{swatch}"/>"#,
            WIDTH - PADDING - 140.0,
            legend_y - 10.0
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{legend_y:.1}" font-family="Arial" font-size="14">{}</text>"#,
            WIDTH - PADDING - 122.0,
            escape_xml(series.label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

impl ChartPort for SvgChartAdapter {
    fn render(&self, view: &MergedResultView, kind: ChartKind) -> Result<String, SimError> {
        let data = chart_data(view, kind)?;
        Ok(render_svg(&data))
    }
}
