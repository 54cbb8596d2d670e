//! CSV parser for flight-record datasets.
//!
//! Field-level problems never fail a load: bad dates become unknown and bad
//! delay values become zero. Only a missing required column is fatal.

use std::borrow::Cow;
use std::io::Read;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, info, warn};

use crate::error::SchemaError;
use crate::flights::{DelayCauses, FlightRecord, FlightTable};
use crate::source::Source;

/// Columns every dataset must provide, in reporting order.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "FL_DATE",
    "AIRLINE",
    "ORIGIN",
    "DEST",
    "ARR_DELAY",
    "DEP_DELAY",
    "DELAY_DUE_CARRIER",
    "DELAY_DUE_WEATHER",
    "DELAY_DUE_NAS",
    "DELAY_DUE_SECURITY",
    "DELAY_DUE_LATE_AIRCRAFT",
    "CANCELLATION_CODE",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses a flight date, returning `None` for anything unrecognised.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a delay value in minutes. Missing, non-numeric or non-finite
/// values are treated as no delay.
pub fn coerce_delay(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Header positions of the required columns.
struct ColumnIndex {
    fl_date: usize,
    airline: usize,
    origin: usize,
    dest: usize,
    arr_delay: usize,
    dep_delay: usize,
    carrier: usize,
    weather: usize,
    nas: usize,
    security: usize,
    late_aircraft: usize,
    cancellation_code: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &ByteRecord) -> Result<Self, SchemaError> {
        let names: Vec<Cow<'_, str>> = headers.iter().map(String::from_utf8_lossy).collect();
        let position = |name: &str| names.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&name| position(name).is_none())
            .map(|&name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }

        // Every lookup below is present, checked above.
        let at = |name: &str| position(name).unwrap_or_default();
        Ok(ColumnIndex {
            fl_date: at("FL_DATE"),
            airline: at("AIRLINE"),
            origin: at("ORIGIN"),
            dest: at("DEST"),
            arr_delay: at("ARR_DELAY"),
            dep_delay: at("DEP_DELAY"),
            carrier: at("DELAY_DUE_CARRIER"),
            weather: at("DELAY_DUE_WEATHER"),
            nas: at("DELAY_DUE_NAS"),
            security: at("DELAY_DUE_SECURITY"),
            late_aircraft: at("DELAY_DUE_LATE_AIRCRAFT"),
            cancellation_code: at("CANCELLATION_CODE"),
        })
    }

    fn record(&self, row: &ByteRecord) -> FlightRecord {
        let field = |idx: usize| field_text(row, idx);

        FlightRecord::new(
            field(self.airline).trim(),
            field(self.origin).trim(),
            field(self.dest).trim(),
            coerce_delay(&field(self.arr_delay)),
        )
        .with_date(parse_date(&field(self.fl_date)))
        .with_dep_delay(coerce_delay(&field(self.dep_delay)))
        .with_causes(DelayCauses {
            carrier: coerce_delay(&field(self.carrier)),
            weather: coerce_delay(&field(self.weather)),
            nas: coerce_delay(&field(self.nas)),
            security: coerce_delay(&field(self.security)),
            late_aircraft: coerce_delay(&field(self.late_aircraft)),
        })
        .with_cancellation_code(&field(self.cancellation_code))
    }
}

/// Field `idx` of `row` as text. Undecodable bytes become U+FFFD, so a
/// damaged field goes through the usual coercion instead of failing the row.
fn field_text(row: &ByteRecord, idx: usize) -> Cow<'_, str> {
    String::from_utf8_lossy(row.get(idx).unwrap_or_default())
}

/// Parses CSV flight records from `reader` into a [`FlightTable`].
///
/// # Errors
///
/// Returns a [`SchemaError`] (inside the `anyhow::Error`) when a required
/// column is missing, or an error if the CSV itself cannot be read.
pub fn parse_flights<R: Read>(reader: R) -> Result<FlightTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .byte_headers()
        .context("failed to read CSV header")?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut row = ByteRecord::new();
    while rdr.read_byte_record(&mut row).context("failed to read CSV row")? {
        records.push(columns.record(&row));
    }

    let unknown_dates = records.iter().filter(|r| r.month().is_none()).count();
    if unknown_dates > 0 {
        warn!(unknown_dates, "Rows with unparseable FL_DATE kept with unknown month");
    }
    debug!(rows = records.len(), "Flight records parsed");

    Ok(FlightTable::from_records(records))
}

/// Reads `source` (decompressing `.gz`) and parses it into a [`FlightTable`].
#[tracing::instrument(skip_all, fields(source = %source))]
pub async fn load_source(source: &Source) -> Result<FlightTable> {
    let bytes = source.read_decoded().await?;
    let table = parse_flights(bytes.as_ref())
        .with_context(|| format!("failed to load flights from {source}"))?;
    info!(rows = table.len(), "Flight table loaded");
    Ok(table)
}
