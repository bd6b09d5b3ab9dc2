//! # view::export
//!
//! CSV download of the merged forecast (`forecast_results.csv`).

use crate::models::ForecastTable;

pub const EXPORT_FILE_NAME: &str = "forecast_results.csv";

/// Serialise `table` with header `date,forecast_yield,forecast_price`.
///
/// Floats are written in shortest round-trip form, so parsing the file back
/// yields bit-identical values.
pub fn forecast_csv(table: &ForecastTable) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &table.rows {
        writer.serialize(row)?;
    }
    if table.rows.is_empty() {
        writer.write_record(["date", "forecast_yield", "forecast_price"])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::forecaster::month_ends_after;
    use crate::models::ForecastRow;

    fn table() -> ForecastTable {
        let values = [15.0, 0.1 + 0.2, 1.0 / 3.0, 1e-9, 123456.789];
        ForecastTable {
            rows: month_ends_after("2024-01-31".parse().unwrap(), 12)
                .into_iter()
                .enumerate()
                .map(|(i, date)| ForecastRow {
                    date,
                    forecast_yield: values[i % values.len()],
                    forecast_price: 300.0 + i as f64 * 0.7,
                })
                .collect(),
        }
    }

    #[test]
    fn csv_has_header_and_twelve_rows() {
        let bytes = forecast_csv(&table()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("date,forecast_yield,forecast_price"));
        assert_eq!(lines.next(), Some("2024-02-29,15.0,300.0"));
        assert_eq!(text.lines().count(), 13);
    }

    #[test]
    fn csv_reparses_to_identical_values() {
        let original = table();
        let bytes = forecast_csv(&original).unwrap();

        let parsed: Vec<ForecastRow> = csv::Reader::from_reader(bytes.as_slice())
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(parsed, original.rows);
    }

    #[test]
    fn empty_table_still_has_header() {
        let bytes = forecast_csv(&ForecastTable::default()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "date,forecast_yield,forecast_price\n");
    }
}
