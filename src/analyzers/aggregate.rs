use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::airports::coordinate;
use crate::analyzers::types::{
    AirportDelay, CarrierVolume, CauseMinutes, DelayCause, MonthlyDelay, ReasonCount,
    RouteDelayMatrix,
};
use crate::analyzers::utility::{RunningMean, pct};
use crate::flights::{CancellationReason, FlightTable, YearMonth};

/// Flights per carrier, busiest first. Ties are ordered by carrier code.
pub fn carrier_volume(table: &FlightTable) -> Vec<CarrierVolume> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in table {
        *counts.entry(record.carrier()).or_default() += 1;
    }

    let mut volume: Vec<CarrierVolume> = counts
        .into_iter()
        .map(|(carrier, flight_count)| CarrierVolume {
            carrier: carrier.to_string(),
            flight_count,
        })
        .collect();
    volume.sort_by(|a, b| {
        b.flight_count
            .cmp(&a.flight_count)
            .then_with(|| a.carrier.cmp(&b.carrier))
    });
    volume
}

/// Cancelled flights per known reason, most frequent first. Ties are
/// ordered by reason label. Rows without a recognised reason are skipped.
pub fn cancellation_reasons(table: &FlightTable) -> Vec<ReasonCount> {
    let mut counts: HashMap<CancellationReason, usize> = HashMap::new();
    for reason in table.iter().filter_map(|r| r.cancellation_reason()) {
        *counts.entry(reason).or_default() += 1;
    }

    let mut reasons: Vec<ReasonCount> = counts
        .into_iter()
        .map(|(reason, count)| ReasonCount { reason, count })
        .collect();
    reasons.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.reason.label().cmp(b.reason.label()))
    });
    reasons
}

/// Mean arrival delay per route, pivoted to origins × destinations. Rows
/// with an empty origin or destination code are left out.
///
/// Rows with fewer than `threshold` populated cells are dropped first; then
/// columns with fewer than `threshold` populated cells among the kept rows.
/// Each filter runs once, so a kept row may end up below `threshold` after
/// columns are removed.
pub fn route_delay_matrix(table: &FlightTable, threshold: usize) -> RouteDelayMatrix {
    let mut routes: BTreeMap<(&str, &str), RunningMean> = BTreeMap::new();
    for record in table {
        if record.origin().is_empty() || record.destination().is_empty() {
            continue;
        }
        routes
            .entry((record.origin(), record.destination()))
            .or_default()
            .push(record.arr_delay());
    }

    let mut row_population: BTreeMap<&str, usize> = BTreeMap::new();
    for &(origin, _) in routes.keys() {
        *row_population.entry(origin).or_default() += 1;
    }
    let origins: Vec<&str> = row_population
        .into_iter()
        .filter(|&(_, populated)| populated >= threshold)
        .map(|(origin, _)| origin)
        .collect();
    let kept_origins: BTreeSet<&str> = origins.iter().copied().collect();

    let mut column_population: BTreeMap<&str, usize> = BTreeMap::new();
    for &(origin, destination) in routes.keys() {
        if kept_origins.contains(origin) {
            *column_population.entry(destination).or_default() += 1;
        }
    }
    let destinations: Vec<&str> = column_population
        .into_iter()
        .filter(|&(_, populated)| populated >= threshold)
        .map(|(destination, _)| destination)
        .collect();

    if origins.is_empty() || destinations.is_empty() {
        return RouteDelayMatrix::default();
    }

    let cells: Vec<Vec<Option<f64>>> = origins
        .iter()
        .map(|&origin| {
            destinations
                .iter()
                .map(|&destination| routes.get(&(origin, destination)).map(RunningMean::value))
                .collect::<Vec<_>>()
        })
        .collect();

    RouteDelayMatrix {
        origins: origins.into_iter().map(String::from).collect(),
        destinations: destinations.into_iter().map(String::from).collect(),
        cells,
    }
}

/// Marker size for an average delay: early arrivals clip to zero.
pub fn marker_size(avg_delay: f64) -> f64 {
    avg_delay.max(0.0)
}

/// Mean arrival delay per origin airport, for airports with a known
/// coordinate, ordered by IATA code.
pub fn airport_delays(table: &FlightTable) -> Vec<AirportDelay> {
    let mut by_origin: BTreeMap<&str, RunningMean> = BTreeMap::new();
    for record in table.iter().filter(|r| !r.origin().is_empty()) {
        by_origin
            .entry(record.origin())
            .or_default()
            .push(record.arr_delay());
    }

    by_origin
        .into_iter()
        .filter_map(|(iata, mean)| {
            let coord = coordinate(iata)?;
            let avg_delay = mean.value();
            Some(AirportDelay {
                iata: iata.to_string(),
                avg_delay,
                latitude: coord.latitude,
                longitude: coord.longitude,
                size: marker_size(avg_delay),
            })
        })
        .collect()
}

/// Flights and delayed flights per calendar month. Rows with an unknown
/// date are not counted.
pub fn monthly_delays(table: &FlightTable) -> Vec<MonthlyDelay> {
    let mut months: BTreeMap<YearMonth, (usize, usize)> = BTreeMap::new();
    for record in table {
        let Some(month) = record.month() else {
            continue;
        };
        let entry = months.entry(month).or_default();
        entry.0 += 1;
        if record.is_delayed() {
            entry.1 += 1;
        }
    }

    months
        .into_iter()
        .map(|(month, (flights, delayed))| MonthlyDelay {
            month,
            flights,
            delayed,
            delay_rate_pct: pct(delayed, flights),
        })
        .collect()
}

/// Total delay minutes per cause, in a fixed cause order.
pub fn delay_cause_minutes(table: &FlightTable) -> Vec<CauseMinutes> {
    if table.is_empty() {
        return Vec::new();
    }

    let mut totals = [0.0f64; 5];
    for record in table {
        let causes = record.causes();
        totals[0] += causes.carrier;
        totals[1] += causes.weather;
        totals[2] += causes.nas;
        totals[3] += causes.security;
        totals[4] += causes.late_aircraft;
    }

    [
        DelayCause::Carrier,
        DelayCause::Weather,
        DelayCause::Nas,
        DelayCause::Security,
        DelayCause::LateAircraft,
    ]
    .into_iter()
    .zip(totals)
    .map(|(cause, minutes)| CauseMinutes { cause, minutes })
    .collect()
}
