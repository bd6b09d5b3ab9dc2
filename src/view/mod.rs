//! # view — Presentation layer
//!
//! Pure functions from already-computed data to HTML / SVG / CSV. Nothing
//! here touches state; a failure upstream renders as an inline message.

pub mod chart;
pub mod export;
pub mod page;

pub use export::{forecast_csv, EXPORT_FILE_NAME};
pub use page::{dashboard_page, login_page, DashboardView};

/// HTML-escape user-controlled text.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<script>alert('x')</script> & "q""#),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; &quot;q&quot;"
        );
    }
}
