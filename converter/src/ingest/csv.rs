use super::{
    is_builtin_tag, param_keys, split_benchmark, CollisionPolicy, Header, IngestError,
    IngestSettings,
};
use crate::record::{MeasurementRecord, TagSet};
use ::csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::io::Read;
use tracing::{debug, trace, warn};

/// Lazy reader turning the rows of one result file into measurement records
///
/// Rows with a different unit are skipped. The first error ends the
/// iteration; the reader is not restartable.
pub struct RecordReader<'a, R: Read> {
    records: StringRecordsIntoIter<R>,
    header: Header,
    // tag key of every parameter column, parallel to `header.params`
    keys: Vec<String>,
    build: String,
    timestamp: i64,
    settings: &'a IngestSettings,
    rows: u64,
    skipped: u64,
    failed: bool,
}

impl<'a, R: Read> RecordReader<'a, R> {
    /// read the header of `source` and prepare to stream its rows
    pub fn new(
        source: R,
        build: impl Into<String>,
        timestamp: i64,
        settings: &'a IngestSettings,
    ) -> Result<Self, IngestError> {
        // short rows are reported by us, not by the csv reader
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
        let header = Header::parse(reader.headers()?)?;
        let keys = param_keys(&header.params, settings.collisions);

        Ok(Self {
            records: reader.into_records(),
            header,
            keys,
            build: build.into(),
            timestamp,
            settings,
            rows: 0,
            skipped: 0,
            failed: false,
        })
    }

    /// number of data rows read so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// number of data rows dropped due to their unit
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn build_record(&self, row: &StringRecord) -> Result<Option<MeasurementRecord>, IngestError> {
        if row.len() < self.header.width {
            return Err(IngestError::ShortRow {
                row: self.rows,
                found: row.len(),
                expected: self.header.width,
            });
        }

        if &row[self.header.unit] != self.settings.unit.as_str() {
            return Ok(None);
        }

        let benchmark = &row[self.header.benchmark];
        let (algo, test) = split_benchmark(benchmark)
            .ok_or_else(|| IngestError::MalformedBenchmark(benchmark.to_owned()))?;

        let mut tags = TagSet::with_capacity(3 + self.header.params.len());
        tags.insert("algo", algo);
        tags.insert("test", test);
        tags.insert("build", self.build.as_str());

        for ((index, name), key) in self.header.params.iter().zip(self.keys.iter()) {
            let value = &row[*index];

            if value.is_empty() {
                continue;
            }

            // repeated parameter columns overwrite each other under every policy
            if is_builtin_tag(name) {
                match self.settings.collisions {
                    CollisionPolicy::Overwrite => {
                        debug!(tag = %name, value = %value, "Parameter overwrites built-in tag");
                    }
                    CollisionPolicy::Reject => {
                        return Err(IngestError::TagCollision {
                            column: format!("{}{name}", super::PARAM_PREFIX),
                            tag: name.clone(),
                        });
                    }
                    CollisionPolicy::Rename => {}
                }
            }

            tags.insert(key.as_str(), value);
        }

        Ok(Some(MeasurementRecord {
            value: row[self.header.score].to_owned(),
            timestamp: self.timestamp,
            tags,
        }))
    }
}

impl<R: Read> Iterator for RecordReader<'_, R> {
    type Item = Result<MeasurementRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let row = match self.records.next()? {
                Ok(row) => row,
                Err(error) => {
                    warn!(error = ?error, "Failed to read CSV row");
                    self.failed = true;

                    return Some(Err(error.into()));
                }
            };
            self.rows += 1;

            match self.build_record(&row) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {
                    self.skipped += 1;
                    trace!(row = self.rows, unit = &row[self.header.unit], "Skipped row");
                }
                Err(error) => {
                    self.failed = true;

                    return Some(Err(error));
                }
            }
        }
    }
}
