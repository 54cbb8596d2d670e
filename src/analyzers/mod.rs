//! Flight data aggregation.
//!
//! Each view in [`aggregate`] is a pure function of a [`crate::flights::FlightTable`].
//! [`report`] bundles them into a [`types::FlightReport`], and [`writetos3`]
//! publishes a report as JSON objects to S3.

pub mod aggregate;
pub mod report;
pub mod types;
pub mod utility;
pub mod writetos3;
