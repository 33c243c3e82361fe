//! Conversion of JMH style benchmark result files into line protocol
//!
//! The pipeline is strictly linear: the [`collector`] lists the result files,
//! [`ingest`] streams their rows as [`record::MeasurementRecord`]s,
//! [`protocol`] turns every record into one line and the [`sink`] receives
//! the lines. [`convert::Converter`] drives the whole run.

pub mod clock;
pub mod collector;
pub mod config;
pub mod convert;
pub mod ingest;
pub mod protocol;
pub mod record;
pub mod sink;
