//! Static airport coordinates used to place airports on a map.

use serde::Serialize;

/// Latitude/longitude of an airport, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AirportCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Known airports as `(IATA, latitude, longitude)`.
static AIRPORT_COORDS: &[(&str, f64, f64)] = &[
    ("DFW", 32.8998, -97.0403),
    ("SEA", 47.4502, -122.3088),
    ("SFO", 37.6213, -122.3790),
    ("FLL", 26.0726, -80.1527),
    ("MSP", 44.8848, -93.2223),
    ("DEN", 39.8561, -104.6737),
    ("MCO", 28.4312, -81.3081),
    ("DCA", 38.8512, -77.0402),
    ("BOS", 42.3656, -71.0096),
    ("ORD", 41.9742, -87.9073),
    ("EWR", 40.6895, -74.1745),
    ("OKC", 35.3931, -97.6007),
    ("DAL", 32.8471, -96.8517),
    ("HSV", 34.6372, -86.7751),
    ("SFB", 28.7776, -81.2375),
    ("SWF", 41.5041, -74.1048),
    ("ATL", 33.6407, -84.4277),
    ("LAX", 33.9416, -118.4085),
    ("PHX", 33.4342, -112.0116),
    ("LAS", 36.0840, -115.1537),
    ("JFK", 40.6413, -73.7781),
];

/// Looks up the coordinate of an airport by IATA code.
pub fn coordinate(iata: &str) -> Option<AirportCoordinate> {
    AIRPORT_COORDS
        .iter()
        .find(|(code, _, _)| *code == iata)
        .map(|&(_, latitude, longitude)| AirportCoordinate {
            latitude,
            longitude,
        })
}

/// IATA codes of every airport with a known coordinate.
pub fn known_airports() -> impl Iterator<Item = &'static str> {
    AIRPORT_COORDS.iter().map(|(code, _, _)| *code)
}
