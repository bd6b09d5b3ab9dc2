//! # view::page
//!
//! Full HTML documents: the login form and the dashboard.

use std::fmt::Write;

use crate::{
    auth::Identity,
    engine::forecaster::ForecastOutcome,
    models::{ForecastSeries, ProductionTable, Species},
    view::{chart, escape},
};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; color: #1f2933; }
aside { width: 240px; min-height: 100vh; padding: 1.5rem; background: #f0f4f8; box-sizing: border-box; }
main { flex: 1; padding: 1.5rem 2rem; }
label { display: block; margin-top: .75rem; font-size: .9rem; }
input, select, button { width: 100%; padding: .4rem; margin-top: .25rem; box-sizing: border-box; }
table { border-collapse: collapse; margin: .5rem 0 1.5rem; }
th, td { border: 1px solid #d9e2ec; padding: .3rem .6rem; text-align: right; }
.columns { display: flex; gap: 1.5rem; flex-wrap: wrap; }
.columns > section { flex: 1; min-width: 320px; }
.chart { width: 100%; max-width: 560px; background: #fff; }
.chart .axis { stroke: #829ab1; }
.chart .series { stroke: #2680c2; stroke-width: 2; }
.chart .point { fill: #2680c2; }
.chart text { font-size: 11px; fill: #486581; }
.chart .chart-title { font-size: 14px; fill: #102a43; }
.error { background: #ffe3e3; border-left: 4px solid #e12d39; padding: .6rem 1rem; margin: .75rem 0; }
.warning { background: #fff3c4; border-left: 4px solid #f0b429; padding: .6rem 1rem; margin: .75rem 0; }
.caption { font-size: .8rem; color: #627d98; margin-top: 1.5rem; }
.login { max-width: 320px; margin: 4rem auto; }
"#;

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title),
    )
}

// ─── Login ────────────────────────────────────────────────────────────────────

/// Login form, optionally with a warning banner.
pub fn login_page(warning: Option<&str>) -> String {
    let mut body = String::from(r#"<main class="login"><h1>Login</h1>"#);
    if let Some(msg) = warning {
        let _ = write!(body, r#"<div class="warning">{}</div>"#, escape(msg));
    }
    body.push_str(
        r#"<form method="post" action="/login">
<label>Username<input name="username" autocomplete="username" required></label>
<label>Password<input name="password" type="password" autocomplete="current-password" required></label>
<button type="submit">Login</button>
</form></main>"#,
    );
    document("Aqua Forecast — Login", &body)
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

/// Everything one render pass produced.
///
/// `error` set means the pipeline halted before forecasting (bad input,
/// data access failure or no matching rows).
pub struct DashboardView<'a> {
    pub identity:     &'a Identity,
    pub species:      Species,
    pub region:       &'a str,
    pub error:        Option<String>,
    pub table:        Option<&'a ProductionTable>,
    pub outcome:      Option<&'a ForecastOutcome>,
    pub preview_rows: usize,
}

pub fn dashboard_page(view: &DashboardView<'_>) -> String {
    let mut body = String::with_capacity(16 * 1024);
    sidebar(&mut body, view);

    body.push_str("<main><h1>📈 Aquaculture Yield &amp; Market Price Forecast Dashboard</h1>");

    if let Some(err) = &view.error {
        let _ = write!(body, r#"<div class="error">{}</div>"#, escape(err));
    } else if let (Some(table), Some(outcome)) = (view.table, view.outcome) {
        preview(&mut body, view, table);
        forecasts(&mut body, outcome);

        if let Some(map) = chart::farm_map(table) {
            let _ = write!(body, "<h2>🗺️ Farm Map</h2>{map}");
        }

        download(&mut body, view, outcome);
    }

    body.push_str("</main>");
    document("Aqua Forecast", &body)
}

fn sidebar(body: &mut String, view: &DashboardView<'_>) {
    body.push_str(r#"<aside><h3>🔍 Filter Data</h3><form method="get" action="/"><label>Species<select name="species">"#);
    for species in Species::ALL {
        let selected = if species == view.species { " selected" } else { "" };
        let _ = write!(body, r#"<option value="{species}"{selected}>{species}</option>"#);
    }
    let _ = write!(
        body,
        r#"</select></label><label>Region (e.g. Andhra Pradesh)<input name="region" value="{}"></label><button type="submit">Apply</button></form>"#,
        escape(view.region),
    );
    let _ = write!(
        body,
        r#"<p class="caption">🧑 Logged in as: {}</p><form method="post" action="/logout"><button type="submit">Logout</button></form></aside>"#,
        escape(&view.identity.display_name),
    );
}

fn preview(body: &mut String, view: &DashboardView<'_>, table: &ProductionTable) {
    let _ = write!(
        body,
        "<h3>{} Data for {}</h3><table><thead><tr><th>date</th><th>species</th><th>region</th><th>yield</th><th>price</th>",
        view.species,
        escape(view.region),
    );
    if table.has_coordinates {
        body.push_str("<th>latitude</th><th>longitude</th>");
    }
    body.push_str("</tr></thead><tbody>");

    for r in table.head(view.preview_rows) {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            r.date,
            escape(&r.species),
            escape(&r.region),
            r.yield_value,
            r.price,
        );
        if table.has_coordinates {
            let _ = write!(body, "<td>{}</td><td>{}</td>", opt(r.latitude), opt(r.longitude));
        }
        body.push_str("</tr>");
    }
    let _ = write!(body, "</tbody></table><p class=\"caption\">{} rows total</p>", table.len());
}

fn opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn forecasts(body: &mut String, outcome: &ForecastOutcome) {
    body.push_str("<h2>📊 Forecasts</h2>");
    for err in &outcome.errors {
        let _ = write!(body, r#"<div class="error">{}</div>"#, escape(err));
    }

    body.push_str(r#"<div class="columns">"#);
    forecast_column(body, &outcome.yield_series, "Projected Yield");
    forecast_column(body, &outcome.price_series, "Projected Price");
    body.push_str("</div>");
}

fn forecast_column(body: &mut String, series: &ForecastSeries, title: &str) {
    let _ = write!(body, "<section><h3>{} Forecast</h3>", series.target.label());
    if series.is_empty() {
        body.push_str("<p>No forecast available.</p>");
    } else {
        body.push_str(&chart::line_chart(series, title));
    }
    body.push_str("</section>");
}

fn download(body: &mut String, view: &DashboardView<'_>, outcome: &ForecastOutcome) {
    body.push_str("<h2>⬇️ Download Forecast Data</h2>");
    if outcome.yield_series.is_empty() || outcome.price_series.is_empty() {
        body.push_str("<p>Both forecasts are required for the CSV export.</p>");
        return;
    }
    let _ = write!(
        body,
        r#"<a href="/api/forecast.csv?species={}&amp;region={}" download>Download as CSV</a>"#,
        view.species,
        escape(&urlencoding::encode(view.region)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastPoint, ForecastTarget, ProductionRecord};

    fn identity() -> Identity {
        Identity { username: "alice".into(), display_name: "Alice <admin>".into() }
    }

    fn table() -> ProductionTable {
        ProductionTable::new(
            vec![ProductionRecord {
                date:        "2024-01-31".parse().unwrap(),
                species:     "Shrimp".into(),
                region:      "Andhra Pradesh".into(),
                yield_value: 14.0,
                price:       320.0,
                latitude:    Some(16.5),
                longitude:   Some(81.5),
            }],
            true,
        )
    }

    fn series(target: ForecastTarget) -> ForecastSeries {
        ForecastSeries {
            target,
            points: vec![ForecastPoint { date: "2024-02-29".parse().unwrap(), value: 15.0 }],
        }
    }

    #[test]
    fn halted_dashboard_shows_only_the_error() {
        let who = identity();
        let html = dashboard_page(&DashboardView {
            identity:     &who,
            species:      Species::Catla,
            region:       "Nowhere",
            error:        Some("No data found for selected filters.".into()),
            table:        None,
            outcome:      None,
            preview_rows: 5,
        });
        assert!(html.contains("No data found for selected filters."));
        assert!(!html.contains("Forecasts"));
        assert!(html.contains(r#"<option value="Catla" selected>"#));
        assert!(html.contains("Alice &lt;admin&gt;"));
    }

    #[test]
    fn full_dashboard_has_charts_map_and_download() {
        let who = identity();
        let table = table();
        let outcome = ForecastOutcome {
            yield_series: series(ForecastTarget::Yield),
            price_series: series(ForecastTarget::Price),
            errors:       vec![],
        };
        let html = dashboard_page(&DashboardView {
            identity:     &who,
            species:      Species::Shrimp,
            region:       "Andhra Pradesh",
            error:        None,
            table:        Some(&table),
            outcome:      Some(&outcome),
            preview_rows: 5,
        });
        assert!(html.contains("Shrimp Data for Andhra Pradesh"));
        assert!(html.contains("Projected Yield"));
        assert!(html.contains("Projected Price"));
        assert!(html.contains("Farm Map"));
        assert!(html.contains("/api/forecast.csv?species=Shrimp&amp;region=Andhra%20Pradesh"));
    }

    #[test]
    fn failed_model_hides_download_but_keeps_other_chart() {
        let who = identity();
        let table = table();
        let outcome = ForecastOutcome {
            yield_series: ForecastSeries::empty(ForecastTarget::Yield),
            price_series: series(ForecastTarget::Price),
            errors:       vec!["Yield prediction error: boom".into()],
        };
        let html = dashboard_page(&DashboardView {
            identity:     &who,
            species:      Species::Shrimp,
            region:       "Andhra Pradesh",
            error:        None,
            table:        Some(&table),
            outcome:      Some(&outcome),
            preview_rows: 5,
        });
        assert!(html.contains("Yield prediction error: boom"));
        assert!(html.contains("Projected Price"));
        assert!(!html.contains("Download as CSV"));
    }

    #[test]
    fn login_page_escapes_warning() {
        let html = login_page(Some("<b>nope</b>"));
        assert!(html.contains("&lt;b&gt;nope&lt;/b&gt;"));
        assert!(html.contains(r#"action="/login""#));
    }
}
