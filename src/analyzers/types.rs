//! Result tables produced by the aggregation views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::flights::{CancellationReason, YearMonth};

/// Number of flights operated by one carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierVolume {
    pub carrier: String,
    pub flight_count: usize,
}

/// Number of cancelled flights attributed to one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCount {
    pub reason: CancellationReason,
    pub count: usize,
}

/// Average arrival delay per origin × destination, after the density filter.
///
/// `cells[i][j]` is the mean for `origins[i]` → `destinations[j]`, or `None`
/// when no flight flew that route.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteDelayMatrix {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl RouteDelayMatrix {
    pub fn get(&self, origin: &str, destination: &str) -> Option<f64> {
        let row = self.origins.iter().position(|o| o == origin)?;
        let col = self.destinations.iter().position(|d| d == destination)?;
        self.cells[row][col]
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty() || self.destinations.is_empty()
    }

    /// Populated cells in each row, in `origins` order.
    pub fn row_populations(&self) -> Vec<usize> {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|c| c.is_some()).count())
            .collect()
    }

    /// Populated cells in each column, in `destinations` order.
    pub fn column_populations(&self) -> Vec<usize> {
        (0..self.destinations.len())
            .map(|col| self.cells.iter().filter(|row| row[col].is_some()).count())
            .collect()
    }
}

/// Average arrival delay at an origin airport with a known location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportDelay {
    pub iata: String,
    pub avg_delay: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Marker size: `avg_delay` clipped at zero.
    pub size: f64,
}

/// Delay rate for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyDelay {
    pub month: YearMonth,
    pub flights: usize,
    pub delayed: usize,
    pub delay_rate_pct: f64,
}

/// Cause a delay minute is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DelayCause {
    Carrier,
    Weather,
    #[serde(rename = "NAS")]
    Nas,
    Security,
    #[serde(rename = "Late Aircraft")]
    LateAircraft,
}

/// Total delay minutes attributed to one cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CauseMinutes {
    pub cause: DelayCause,
    pub minutes: f64,
}

/// Every view computed over one flight table.
#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub total_flights: usize,
    pub route_density_threshold: usize,
    pub carrier_volume: Vec<CarrierVolume>,
    pub cancellation_reasons: Vec<ReasonCount>,
    pub route_delays: RouteDelayMatrix,
    pub airport_delays: Vec<AirportDelay>,
    pub monthly_delays: Vec<MonthlyDelay>,
    pub delay_causes: Vec<CauseMinutes>,
}

/// One published view in a [`ReportIndex`].
#[derive(Debug, Serialize)]
pub struct ReportIndexEntry {
    pub view: String,
    pub key: String,
}

/// Top-level listing of a published report, served as `<prefix>/index.json`.
#[derive(Debug, Serialize)]
pub struct ReportIndex {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub total_flights: usize,
    pub views: Vec<ReportIndexEntry>,
}
