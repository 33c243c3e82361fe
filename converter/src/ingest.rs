pub mod csv;


use ::csv::StringRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_UNIT: &str = "us/op";

pub const BENCHMARK_COLUMN: &str = "Benchmark";
pub const UNIT_COLUMN: &str = "Unit";
pub const SCORE_COLUMN: &str = "Score";
pub const PARAM_PREFIX: &str = "Param: ";

/// tags every record carries, parameters may collide with these
pub const BUILTIN_TAGS: [&str; 3] = ["algo", "test", "build"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open result file {path:?}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read CSV input")]
    Csv(#[from] ::csv::Error),
    #[error("Header is missing the required `{0}` column")]
    MissingColumn(&'static str),
    #[error("Row {row} has {found} cells but the header has {expected}")]
    ShortRow {
        row: u64,
        found: usize,
        expected: usize,
    },
    #[error("Benchmark `{0}` has no algorithm segment before its test name")]
    MalformedBenchmark(String),
    #[error("Column `{column}` collides with the tag `{tag}`")]
    TagCollision { column: String, tag: String },
}

/// What to do when a parameter column is named like a built-in tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// the parameter value replaces the existing tag
    #[default]
    Overwrite,
    /// abort the conversion
    Reject,
    /// store the parameter as `param_<name>`
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// only rows with exactly this unit produce records
    pub unit: String,
    pub collisions: CollisionPolicy,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT.to_owned(),
            collisions: CollisionPolicy::default(),
        }
    }
}

/// Column layout of a result file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub benchmark: usize,
    pub unit: usize,
    pub score: usize,
    /// (column index, tag name) in header order
    pub params: Vec<(usize, String)>,
    pub width: usize,
}

impl Header {
    pub fn parse(record: &StringRecord) -> Result<Self, IngestError> {
        let position = |name: &'static str| {
            record
                .iter()
                .position(|column| column == name)
                .ok_or(IngestError::MissingColumn(name))
        };

        let params = record
            .iter()
            .enumerate()
            .filter(|(_, column)| column.starts_with(PARAM_PREFIX))
            .map(|(index, column)| (index, param_name(column).to_owned()))
            .collect::<Vec<_>>();

        debug!(params = ?params, "Parsed result header");

        Ok(Self {
            benchmark: position(BENCHMARK_COLUMN)?,
            unit: position(UNIT_COLUMN)?,
            score: position(SCORE_COLUMN)?,
            params,
            width: record.len(),
        })
    }
}

pub fn is_builtin_tag(name: &str) -> bool {
    BUILTIN_TAGS.contains(&name)
}

/// Tag key written for each parameter column, in header order
///
/// Parameters keep their name unless `policy` is `Rename` and the name is a
/// built-in tag. Such a parameter becomes `param_<name>`, followed by `_2`,
/// `_3`, ... when that key is already used by another column.
pub fn param_keys(params: &[(usize, String)], policy: CollisionPolicy) -> Vec<String> {
    if policy != CollisionPolicy::Rename {
        return params.iter().map(|(_, name)| name.clone()).collect();
    }

    let mut taken = BUILTIN_TAGS
        .iter()
        .map(|tag| tag.to_string())
        .chain(params.iter().map(|(_, name)| name.clone()))
        .collect::<BTreeSet<_>>();
    let mut renamed = BTreeMap::new();

    params
        .iter()
        .map(|(_, name)| {
            if !is_builtin_tag(name) {
                return name.clone();
            }

            renamed
                .entry(name.clone())
                .or_insert_with(|| {
                    let mut key = format!("param_{name}");
                    let mut counter = 2;

                    while taken.contains(&key) {
                        key = format!("param_{name}_{counter}");
                        counter += 1;
                    }
                    taken.insert(key.clone());
                    debug!(tag = %name, renamed = %key, "Renaming colliding parameter");

                    key
                })
                .clone()
        })
        .collect()
}

/// tag name of a `Param: <name>` column, i.e. everything after the colon
fn param_name(column: &str) -> &str {
    column
        .split_once(':')
        .map(|(_, name)| name)
        .unwrap_or(column)
        .trim()
}

/// Build identifier encoded in a result file name
///
/// This is the part before the first `-` without its first character, e.g.
/// `v1.2.3-results.csv` is build `1.2.3`. Names without a `-` use the whole
/// name.
pub fn build_identifier(file_name: &str) -> &str {
    let prefix = file_name.split('-').next().unwrap_or_default();
    let mut chars = prefix.chars();
    chars.next();

    chars.as_str()
}

/// same as `build_identifier` but for a path, looking only at the file name
pub fn build_identifier_of(path: &Path) -> String {
    path.file_name()
        .map(|name| build_identifier(&name.to_string_lossy()).to_owned())
        .unwrap_or_default()
}

/// split a qualified benchmark name into (algo, test), the last two `.` segments
pub fn split_benchmark(name: &str) -> Option<(&str, &str)> {
    let (rest, test) = name.rsplit_once('.')?;
    let algo = rest.rsplit('.').next().unwrap_or(rest);

    Some((algo, test))
}
