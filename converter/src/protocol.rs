use crate::record::MeasurementRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

pub const DEFAULT_MEASUREMENT: &str = "benchmark";
pub const FIELD_KEY: &str = "value";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

const MEASUREMENT_SPECIAL: &[char] = &[',', ' '];
const TAG_SPECIAL: &[char] = &[',', '=', ' '];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Timestamp {0}s cannot be expressed in nanoseconds")]
    TimestampOverflow(i64),
}

/// How reserved characters in names and tags are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// write everything verbatim, existing consumers rely on this output
    #[default]
    Legacy,
    /// backslash escape commas, spaces and equal signs
    Escaped,
}

/// Serializer for measurement records
///
/// Produces `measurement,k1=v1,...,kn=vn value=<score> <nanoseconds>` with
/// the tags in the order of the record's tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProtocol {
    measurement: String,
    escape: EscapeMode,
}

impl Default for LineProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_MEASUREMENT, EscapeMode::default())
    }
}

impl LineProtocol {
    pub fn new(measurement: impl Into<String>, escape: EscapeMode) -> Self {
        Self {
            measurement: measurement.into(),
            escape,
        }
    }

    pub fn serialize(&self, record: &MeasurementRecord) -> Result<String, ProtocolError> {
        let nanoseconds = to_nanoseconds(record.timestamp)?;
        let mut line = String::with_capacity(64 + record.tags.len() * 16);

        line.push_str(&self.escaped(&self.measurement, MEASUREMENT_SPECIAL));
        for (key, value) in record.tags.iter() {
            line.push(',');
            line.push_str(&self.escaped(key, TAG_SPECIAL));
            line.push('=');
            line.push_str(&self.escaped(value, TAG_SPECIAL));
        }
        line.push(' ');
        line.push_str(FIELD_KEY);
        line.push('=');
        line.push_str(&record.value);
        line.push(' ');
        line.push_str(&nanoseconds.to_string());

        Ok(line)
    }

    fn escaped<'a>(&self, input: &'a str, special: &[char]) -> Cow<'a, str> {
        match self.escape {
            EscapeMode::Legacy => Cow::Borrowed(input),
            EscapeMode::Escaped => escape(input, special),
        }
    }
}

pub fn to_nanoseconds(seconds: i64) -> Result<i64, ProtocolError> {
    seconds
        .checked_mul(NANOS_PER_SECOND)
        .ok_or(ProtocolError::TimestampOverflow(seconds))
}

/// prefix every occurrence of `special` with a backslash
pub fn escape<'a>(input: &'a str, special: &[char]) -> Cow<'a, str> {
    if !input.contains(special) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + 4);
    for character in input.chars() {
        if special.contains(&character) {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    Cow::Owned(escaped)
}
