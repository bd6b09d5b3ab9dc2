//! # view::chart
//!
//! Inline SVG rendering for the forecast line charts and the farm scatter
//! map. Output is a self-contained `<svg>` fragment; no client-side script.

use std::fmt::Write;

use crate::{
    models::{ForecastSeries, ProductionTable},
    view::escape,
};

const WIDTH:  f64 = 560.0;
const HEIGHT: f64 = 300.0;
const MARGIN: f64 = 48.0;

/// Maps a data range onto a pixel range. A flat range is widened so a
/// constant series still draws as a centred line.
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo:     f64,
    hi:     f64,
    px_lo:  f64,
    px_hi:  f64,
}

impl Scale {
    fn new(values: impl Iterator<Item = f64>, px_lo: f64, px_hi: f64) -> Self {
        let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !lo.is_finite() || !hi.is_finite() {
            (lo, hi) = (0.0, 1.0);
        }
        if (hi - lo).abs() < f64::EPSILON {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            (lo, hi) = (lo - pad, hi + pad);
        }
        Self { lo, hi, px_lo, px_hi }
    }

    fn map(&self, v: f64) -> f64 {
        self.px_lo + (v - self.lo) / (self.hi - self.lo) * (self.px_hi - self.px_lo)
    }
}

fn frame(svg: &mut String, title: &str, x_label: &str, y_label: &str) {
    let _ = write!(
        svg,
        r##"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{title}">"##,
        title = escape(title),
    );
    let _ = write!(
        svg,
        r##"<text x="{x}" y="20" text-anchor="middle" class="chart-title">{title}</text>"##,
        x = WIDTH / 2.0,
        title = escape(title),
    );
    let _ = write!(
        svg,
        r##"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" class="axis"/><line x1="{m}" y1="{m}" x2="{m}" y2="{b}" class="axis"/>"##,
        m = MARGIN,
        b = HEIGHT - MARGIN,
        r = WIDTH - MARGIN,
    );
    let _ = write!(
        svg,
        r##"<text x="{x}" y="{y}" text-anchor="middle" class="axis-label">{label}</text>"##,
        x = WIDTH / 2.0,
        y = HEIGHT - 8.0,
        label = escape(x_label),
    );
    let _ = write!(
        svg,
        r##"<text x="12" y="{y}" transform="rotate(-90 12 {y})" text-anchor="middle" class="axis-label">{label}</text>"##,
        y = HEIGHT / 2.0,
        label = escape(y_label),
    );
}

/// Line chart of one forecast series, x = date, y = forecast value.
pub fn line_chart(series: &ForecastSeries, title: &str) -> String {
    let mut svg = String::with_capacity(4096);
    frame(&mut svg, title, "date", series.target.column());

    let n = series.points.len();
    let x = Scale::new([0.0, n.saturating_sub(1) as f64].into_iter(), MARGIN, WIDTH - MARGIN);
    let y = Scale::new(series.points.iter().map(|p| p.value), HEIGHT - MARGIN, MARGIN);

    let path: Vec<String> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:.1},{:.1}", x.map(i as f64), y.map(p.value)))
        .collect();
    let _ = write!(svg, r##"<polyline class="series" fill="none" points="{}"/>"##, path.join(" "));

    for (i, p) in series.points.iter().enumerate() {
        let _ = write!(
            svg,
            r##"<circle cx="{:.1}" cy="{:.1}" r="3" class="point"><title>{}: {}</title></circle>"##,
            x.map(i as f64),
            y.map(p.value),
            p.date,
            p.value,
        );
    }

    // axis ticks: first/last date, min/max value
    if let (Some(first), Some(last)) = (series.points.first(), series.points.last()) {
        let _ = write!(
            svg,
            r##"<text x="{m}" y="{b}" class="tick">{first}</text><text x="{r}" y="{b}" text-anchor="end" class="tick">{last}</text>"##,
            m = MARGIN,
            r = WIDTH - MARGIN,
            b = HEIGHT - MARGIN + 16.0,
            first = first.date,
            last = last.date,
        );
        let _ = write!(
            svg,
            r##"<text x="{t}" y="{top}" text-anchor="end" class="tick">{hi:.2}</text><text x="{t}" y="{bottom}" text-anchor="end" class="tick">{lo:.2}</text>"##,
            t = MARGIN - 4.0,
            top = MARGIN + 4.0,
            bottom = HEIGHT - MARGIN,
            hi = y.hi,
            lo = y.lo,
        );
    }

    svg.push_str("</svg>");
    svg
}

/// Scatter of farm locations (x = longitude, y = latitude), colored by
/// yield. `None` when the table has no coordinate columns or no located rows.
pub fn farm_map(table: &ProductionTable) -> Option<String> {
    if !table.has_coordinates {
        return None;
    }
    let located: Vec<_> = table.located().collect();
    if located.is_empty() {
        return None;
    }

    let x = Scale::new(located.iter().map(|(_, _, lon)| *lon), MARGIN, WIDTH - MARGIN);
    let y = Scale::new(located.iter().map(|(_, lat, _)| *lat), HEIGHT - MARGIN, MARGIN);
    let color = Scale::new(located.iter().map(|(r, _, _)| r.yield_value), 0.0, 1.0);

    let mut svg = String::with_capacity(4096);
    frame(&mut svg, "Farm Map", "longitude", "latitude");

    for (record, lat, lon) in &located {
        let _ = write!(
            svg,
            r##"<circle cx="{:.1}" cy="{:.1}" r="6" fill="{}" class="farm"><title>{} — yield {}, price {}</title></circle>"##,
            x.map(*lon),
            y.map(*lat),
            heat(color.map(record.yield_value)),
            escape(&record.region),
            record.yield_value,
            record.price,
        );
    }

    svg.push_str("</svg>");
    Some(svg)
}

/// Blue (low) → red (high) for `t` in `[0, 1]`.
fn heat(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let r = (40.0 + 200.0 * t).round() as u8;
    let b = (220.0 - 180.0 * t).round() as u8;
    format!("rgb({r},90,{b})")
}
