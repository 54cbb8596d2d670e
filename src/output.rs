//! Output formatting and persistence for flight reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV files per view.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{
    AirportDelay, CarrierVolume, CauseMinutes, FlightReport, MonthlyDelay, ReasonCount,
    RouteDelayMatrix,
};

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &FlightReport) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &FlightReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// A view row with a fixed CSV header, so empty views still get one.
pub trait CsvRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl CsvRow for CarrierVolume {
    const HEADER: &'static [&'static str] = &["carrier", "flight_count"];
}

impl CsvRow for ReasonCount {
    const HEADER: &'static [&'static str] = &["reason", "count"];
}

impl CsvRow for AirportDelay {
    const HEADER: &'static [&'static str] = &["iata", "avg_delay", "latitude", "longitude", "size"];
}

impl CsvRow for MonthlyDelay {
    const HEADER: &'static [&'static str] = &["month", "flights", "delayed", "delay_rate_pct"];
}

impl CsvRow for CauseMinutes {
    const HEADER: &'static [&'static str] = &["cause", "minutes"];
}

/// Writes `rows` to a CSV file at `path` with a header row, replacing any
/// existing file. The header is written even when `rows` is empty.
pub fn write_csv<T: CsvRow>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV");

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(T::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the route matrix as CSV: an `ORIGIN` column followed by one
/// column per destination, empty where no flight flew the route.
pub fn write_route_matrix_csv(path: &Path, matrix: &RouteDelayMatrix) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let mut header = vec!["ORIGIN".to_string()];
    header.extend(matrix.destinations.iter().cloned());
    writer.write_record(&header)?;

    for (origin, row) in matrix.origins.iter().zip(&matrix.cells) {
        let mut record = vec![origin.clone()];
        record.extend(
            row.iter()
                .map(|cell| cell.map(|v| format!("{v:.2}")).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `report.json` plus one CSV per view into `dir`, creating it if needed.
#[tracing::instrument(skip(report), fields(dir = %dir.display()))]
pub fn write_report(dir: &Path, report: &FlightReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let json = serde_json::to_vec_pretty(report)?;
    fs::write(dir.join("report.json"), json)?;

    write_csv(&dir.join("carrier_volume.csv"), &report.carrier_volume)?;
    write_csv(&dir.join("cancellation_reasons.csv"), &report.cancellation_reasons)?;
    write_route_matrix_csv(&dir.join("route_delays.csv"), &report.route_delays)?;
    write_csv(&dir.join("airport_delays.csv"), &report.airport_delays)?;
    write_csv(&dir.join("monthly_delays.csv"), &report.monthly_delays)?;
    write_csv(&dir.join("delay_causes.csv"), &report.delay_causes)?;

    info!("Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::flights::{FlightRecord, FlightTable};
    use std::env;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_report() -> FlightReport {
        let table = FlightTable::from_records(vec![
            FlightRecord::new("AA", "DFW", "ORD", 20.0).with_cancellation_code("A"),
            FlightRecord::new("UA", "SEA", "DFW", -5.0),
        ]);
        FlightReport::from_table(&table, &AnalysisConfig::default(), "sample.csv")
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_report());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_report()).unwrap();
    }

    #[test]
    fn test_write_csv_has_header_and_rows() {
        let path = temp_path("flight_delay_stats_test_carriers.csv");
        let _ = fs::remove_file(&path);

        let rows = vec![
            CarrierVolume {
                carrier: "AA".to_string(),
                flight_count: 3,
            },
            CarrierVolume {
                carrier: "UA".to_string(),
                flight_count: 2,
            },
        ];
        write_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["carrier,flight_count", "AA,3", "UA,2"]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_empty_rows_writes_header_only() {
        let path = temp_path("flight_delay_stats_test_empty_months.csv");
        let _ = fs::remove_file(&path);

        write_csv::<MonthlyDelay>(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "month,flights,delayed,delay_rate_pct\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_empty_table_has_headers() {
        let dir = temp_path("flight_delay_stats_test_empty_report");
        let _ = fs::remove_dir_all(&dir);

        let report =
            FlightReport::from_table(&FlightTable::default(), &AnalysisConfig::default(), "empty.csv");
        write_report(&dir, &report).unwrap();

        let carriers = fs::read_to_string(dir.join("carrier_volume.csv")).unwrap();
        assert_eq!(carriers, "carrier,flight_count\n");
        let causes = fs::read_to_string(dir.join("delay_causes.csv")).unwrap();
        assert_eq!(causes, "cause,minutes\n");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_csv_overwrites() {
        let path = temp_path("flight_delay_stats_test_overwrite.csv");
        let rows = vec![CarrierVolume {
            carrier: "AA".to_string(),
            flight_count: 1,
        }];
        write_csv(&path, &rows).unwrap();
        write_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_route_matrix_csv() {
        let path = temp_path("flight_delay_stats_test_matrix.csv");
        let matrix = RouteDelayMatrix {
            origins: vec!["DFW".to_string(), "ORD".to_string()],
            destinations: vec!["LAX".to_string(), "SEA".to_string()],
            cells: vec![vec![Some(12.346), None], vec![Some(-1.0), Some(0.0)]],
        };
        write_route_matrix_csv(&path, &matrix).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["ORIGIN,LAX,SEA", "DFW,12.35,", "ORD,-1.00,0.00"]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_creates_all_files() {
        let dir = temp_path("flight_delay_stats_test_report");
        let _ = fs::remove_dir_all(&dir);

        write_report(&dir, &sample_report()).unwrap();

        for name in [
            "report.json",
            "carrier_volume.csv",
            "cancellation_reasons.csv",
            "route_delays.csv",
            "airport_delays.csv",
            "monthly_delays.csv",
            "delay_causes.csv",
        ] {
            assert!(dir.join(name).exists(), "missing {name}");
        }

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.join("report.json")).unwrap()).unwrap();
        assert_eq!(json["total_flights"], 2);
        assert_eq!(json["cancellation_reasons"][0]["reason"], "Carrier");

        fs::remove_dir_all(&dir).unwrap();
    }
}
