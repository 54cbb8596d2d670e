use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::analyzers::aggregate::{
    airport_delays, cancellation_reasons, carrier_volume, delay_cause_minutes, monthly_delays,
    route_delay_matrix,
};
use crate::analyzers::types::FlightReport;
use crate::config::AnalysisConfig;
use crate::flights::FlightTable;

impl FlightReport {
    /// Computes every view one after another on the current thread.
    pub fn from_table(table: &FlightTable, config: &AnalysisConfig, source: &str) -> Self {
        FlightReport {
            generated_at: Utc::now(),
            source: source.to_string(),
            total_flights: table.len(),
            route_density_threshold: config.route_density_threshold,
            carrier_volume: carrier_volume(table),
            cancellation_reasons: cancellation_reasons(table),
            route_delays: route_delay_matrix(table, config.route_density_threshold),
            airport_delays: airport_delays(table),
            monthly_delays: monthly_delays(table),
            delay_causes: delay_cause_minutes(table),
        }
    }
}

/// Runs a view on the blocking pool against the shared table.
async fn run_view<T, F>(table: &Arc<FlightTable>, name: &'static str, view: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&FlightTable) -> T + Send + 'static,
{
    let table = Arc::clone(table);
    tokio::task::spawn_blocking(move || view(&table))
        .await
        .with_context(|| format!("{name} aggregation task failed"))
}

/// Computes every view concurrently over one shared table.
///
/// The result matches [`FlightReport::from_table`]; only the scheduling differs.
#[tracing::instrument(skip(table, config), fields(rows = table.len()))]
pub async fn build_report(
    table: Arc<FlightTable>,
    config: &AnalysisConfig,
    source: &str,
) -> Result<FlightReport> {
    let threshold = config.route_density_threshold;

    let (carriers, reasons, routes, airports, monthly, causes) = tokio::try_join!(
        run_view(&table, "carrier volume", carrier_volume),
        run_view(&table, "cancellation reasons", cancellation_reasons),
        run_view(&table, "route delay", move |t| route_delay_matrix(t, threshold)),
        run_view(&table, "airport delay", airport_delays),
        run_view(&table, "monthly delay", monthly_delays),
        run_view(&table, "delay cause", delay_cause_minutes),
    )?;

    info!(
        carriers = carriers.len(),
        cancellation_reasons = reasons.len(),
        route_origins = routes.origins.len(),
        route_destinations = routes.destinations.len(),
        airports = airports.len(),
        months = monthly.len(),
        "Report built"
    );

    Ok(FlightReport {
        generated_at: Utc::now(),
        source: source.to_string(),
        total_flights: table.len(),
        route_density_threshold: threshold,
        carrier_volume: carriers,
        cancellation_reasons: reasons,
        route_delays: routes,
        airport_delays: airports,
        monthly_delays: monthly,
        delay_causes: causes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights::FlightRecord;
    use chrono::NaiveDate;

    fn sample_table() -> FlightTable {
        let date = NaiveDate::from_ymd_opt(2023, 6, 1);
        FlightTable::from_records(vec![
            FlightRecord::new("AA", "DFW", "ORD", 20.0).with_date(date),
            FlightRecord::new("AA", "ORD", "DFW", -5.0).with_date(date),
            FlightRecord::new("UA", "SFO", "DEN", 40.0).with_cancellation_code("B"),
            FlightRecord::new("WN", "XXX", "DAL", 3.0).with_date(date),
        ])
    }

    #[tokio::test]
    async fn test_parallel_report_matches_sequential() {
        let table = Arc::new(sample_table());
        let config = AnalysisConfig::default().with_route_threshold(Some(1));

        let parallel = build_report(table.clone(), &config, "sample.csv").await.unwrap();
        let sequential = FlightReport::from_table(&table, &config, "sample.csv");

        assert_eq!(parallel.source, "sample.csv");
        assert_eq!(parallel.total_flights, 4);
        assert_eq!(parallel.route_density_threshold, 1);
        assert_eq!(parallel.carrier_volume, sequential.carrier_volume);
        assert_eq!(parallel.cancellation_reasons, sequential.cancellation_reasons);
        assert_eq!(parallel.route_delays, sequential.route_delays);
        assert_eq!(parallel.airport_delays, sequential.airport_delays);
        assert_eq!(parallel.monthly_delays, sequential.monthly_delays);
        assert_eq!(parallel.delay_causes, sequential.delay_causes);
    }

    #[tokio::test]
    async fn test_report_on_empty_table() {
        let report = build_report(Arc::new(FlightTable::default()), &AnalysisConfig::default(), "empty")
            .await
            .unwrap();

        assert_eq!(report.total_flights, 0);
        assert!(report.carrier_volume.is_empty());
        assert!(report.route_delays.is_empty());
        assert!(report.airport_delays.is_empty());
    }

    #[test]
    fn test_sequential_report_views() {
        let report = FlightReport::from_table(&sample_table(), &AnalysisConfig::default(), "s");
        assert_eq!(report.carrier_volume[0].carrier, "AA");
        assert_eq!(report.carrier_volume[0].flight_count, 2);
        assert_eq!(report.cancellation_reasons.len(), 1);
        // Default threshold of 10 empties a four-route matrix.
        assert!(report.route_delays.is_empty());
        let airports: Vec<_> = report.airport_delays.iter().map(|a| a.iata.as_str()).collect();
        assert_eq!(airports, vec!["DFW", "ORD", "SFO"]);
        assert_eq!(report.monthly_delays.len(), 1);
        assert_eq!(report.monthly_delays[0].flights, 3);
    }
}
