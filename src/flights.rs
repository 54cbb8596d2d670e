//! In-memory flight records and the derived fields computed at load time.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// Arrival delay, in minutes, above which a flight counts as delayed.
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

/// Reason attached to a cancelled flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CancellationReason {
    Carrier,
    Weather,
    #[serde(rename = "NAS")]
    Nas,
    Security,
}

/// Fixed cancellation code table: A, B, C, D.
static CANCELLATION_CODES: &[(&str, CancellationReason)] = &[
    ("A", CancellationReason::Carrier),
    ("B", CancellationReason::Weather),
    ("C", CancellationReason::Nas),
    ("D", CancellationReason::Security),
];

impl CancellationReason {
    /// Maps a cancellation code to its reason. Unknown codes map to `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        CANCELLATION_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, reason)| *reason)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CancellationReason::Carrier => "Carrier",
            CancellationReason::Weather => "Weather",
            CancellationReason::Nas => "NAS",
            CancellationReason::Security => "Security",
        }
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calendar month bucket of a flight date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Minutes of delay attributed to each cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DelayCauses {
    pub carrier: f64,
    pub weather: f64,
    pub nas: f64,
    pub security: f64,
    pub late_aircraft: f64,
}

/// One row of the flight dataset.
///
/// Derived fields (`is_delayed`, `month`, `cancellation_reason`) are computed
/// whenever the field they depend on is set, so they always agree with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    flight_date: Option<NaiveDate>,
    carrier: String,
    origin: String,
    destination: String,
    dep_delay: f64,
    arr_delay: f64,
    causes: DelayCauses,
    cancellation_code: Option<String>,

    // derived
    is_delayed: bool,
    month: Option<YearMonth>,
    cancellation_reason: Option<CancellationReason>,
}

impl FlightRecord {
    pub fn new(carrier: &str, origin: &str, destination: &str, arr_delay: f64) -> Self {
        FlightRecord {
            flight_date: None,
            carrier: carrier.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            dep_delay: 0.0,
            arr_delay,
            causes: DelayCauses::default(),
            cancellation_code: None,
            is_delayed: arr_delay > DELAY_THRESHOLD_MINUTES,
            month: None,
            cancellation_reason: None,
        }
    }

    /// Set the flight date; `None` marks it unknown.
    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.flight_date = date;
        self.month = date.map(YearMonth::of);
        self
    }

    pub fn with_dep_delay(mut self, dep_delay: f64) -> Self {
        self.dep_delay = dep_delay;
        self
    }

    pub fn with_causes(mut self, causes: DelayCauses) -> Self {
        self.causes = causes;
        self
    }

    /// Set the cancellation code. An empty code is treated as absent.
    pub fn with_cancellation_code(mut self, code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            self.cancellation_code = None;
            self.cancellation_reason = None;
        } else {
            self.cancellation_code = Some(code.to_string());
            self.cancellation_reason = CancellationReason::from_code(code);
        }
        self
    }

    pub fn flight_date(&self) -> Option<NaiveDate> {
        self.flight_date
    }

    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn dep_delay(&self) -> f64 {
        self.dep_delay
    }

    pub fn arr_delay(&self) -> f64 {
        self.arr_delay
    }

    pub fn causes(&self) -> &DelayCauses {
        &self.causes
    }

    pub fn cancellation_code(&self) -> Option<&str> {
        self.cancellation_code.as_deref()
    }

    pub fn is_delayed(&self) -> bool {
        self.is_delayed
    }

    pub fn month(&self) -> Option<YearMonth> {
        self.month
    }

    pub fn cancellation_reason(&self) -> Option<CancellationReason> {
        self.cancellation_reason
    }
}

/// The loaded dataset. Immutable once built; share it behind an `Arc`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlightTable {
    records: Vec<FlightRecord>,
}

impl FlightTable {
    pub fn from_records(records: Vec<FlightRecord>) -> Self {
        FlightTable { records }
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlightRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlightTable {
    type Item = &'a FlightRecord;
    type IntoIter = std::slice::Iter<'a, FlightRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_delayed_is_strictly_above_threshold() {
        assert!(!FlightRecord::new("AA", "DFW", "ORD", 15.0).is_delayed());
        assert!(FlightRecord::new("AA", "DFW", "ORD", 15.5).is_delayed());
        assert!(!FlightRecord::new("AA", "DFW", "ORD", -4.0).is_delayed());
    }

    #[test]
    fn test_cancellation_code_mapping() {
        let reasons: Vec<_> = ["A", "B", "C", "D", "E", ""]
            .iter()
            .map(|code| {
                FlightRecord::new("AA", "DFW", "ORD", 0.0)
                    .with_cancellation_code(code)
                    .cancellation_reason()
            })
            .collect();

        assert_eq!(
            reasons,
            vec![
                Some(CancellationReason::Carrier),
                Some(CancellationReason::Weather),
                Some(CancellationReason::Nas),
                Some(CancellationReason::Security),
                None,
                None,
            ]
        );
    }

    #[test]
    fn test_unknown_code_is_kept_but_has_no_reason() {
        let record = FlightRecord::new("AA", "DFW", "ORD", 0.0).with_cancellation_code("Z");
        assert_eq!(record.cancellation_code(), Some("Z"));
        assert_eq!(record.cancellation_reason(), None);
    }

    #[test]
    fn test_month_follows_date() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 14);
        let record = FlightRecord::new("AA", "DFW", "ORD", 0.0).with_date(date);
        assert_eq!(
            record.month(),
            Some(YearMonth {
                year: 2023,
                month: 3
            })
        );
        assert_eq!(record.month().unwrap().to_string(), "2023-03");

        let unknown = record.with_date(None);
        assert_eq!(unknown.month(), None);
    }

    #[test]
    fn test_reason_serializes_as_label() {
        let json = serde_json::to_string(&CancellationReason::Nas).unwrap();
        assert_eq!(json, "\"NAS\"");
    }
}
