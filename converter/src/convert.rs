use crate::{
    clock::{Clock, Timestamps},
    collector::CollectorError,
    config::{ConfigErrors, ConverterConfig},
    ingest::{build_identifier_of, csv::RecordReader, IngestError, IngestSettings},
    protocol::{LineProtocol, ProtocolError},
    sink::SinkError,
};
use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error("Failed to convert {path:?}")]
    File {
        path: PathBuf,
        #[source]
        source: IngestError,
    },
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Counters of a conversion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    /// data rows read
    pub rows: u64,
    /// data rows dropped due to their unit
    pub skipped: u64,
    pub lines: u64,
}

impl Summary {
    fn add(&mut self, other: Summary) {
        self.files += other.files;
        self.rows += other.rows;
        self.skipped += other.skipped;
        self.lines += other.lines;
    }
}

/// Converts result files into line protocol, one file after the other
#[derive(Debug)]
pub struct Converter<'a> {
    protocol: LineProtocol,
    settings: IngestSettings,
    clock: &'a dyn Clock,
}

impl<'a> Converter<'a> {
    pub fn new(protocol: LineProtocol, settings: IngestSettings, clock: &'a dyn Clock) -> Self {
        Self {
            protocol,
            settings,
            clock,
        }
    }

    pub fn from_config(config: &ConverterConfig, clock: &'a dyn Clock) -> Self {
        Self::new(config.line_protocol(), config.ingest_settings(), clock)
    }

    /// Convert every file of `paths` in order and write the lines to `output`
    ///
    /// Each file is stamped from a single reading of the clock taken before
    /// the first file is opened. The first error aborts the run, lines
    /// written up to that point stay in `output`.
    #[instrument(skip_all, level = "info")]
    pub fn run<I, W>(&self, paths: I, output: &mut W) -> Result<Summary, ConvertError>
    where
        I: ExactSizeIterator<Item = PathBuf>,
        W: Write,
    {
        let timestamps = Timestamps::new(self.clock, paths.len());
        let mut summary = Summary::default();

        debug!(base = timestamps.base(), files = timestamps.len(), "Assigned timestamps");

        for (index, path) in paths.enumerate() {
            let file_summary = self.convert_file(&path, timestamps.for_index(index), output)?;

            info!(
                "Done with {}/{}: {:?} ({} lines)",
                index + 1,
                timestamps.len(),
                path,
                file_summary.lines
            );
            summary.add(file_summary);
        }

        info!(
            files = summary.files,
            rows = summary.rows,
            skipped = summary.skipped,
            lines = summary.lines,
            "Done with processing"
        );

        Ok(summary)
    }

    /// convert a single result file, the file is closed before returning
    #[instrument(skip(self, output), level = "debug")]
    pub fn convert_file<W: Write>(
        &self,
        path: &Path,
        timestamp: i64,
        output: &mut W,
    ) -> Result<Summary, ConvertError> {
        let file = File::open(path).map_err(|source| ConvertError::File {
            path: path.to_path_buf(),
            source: IngestError::Open {
                path: path.to_path_buf(),
                source,
            },
        })?;

        self.convert_reader(BufReader::new(file), &build_identifier_of(path), timestamp, output)
            .map_err(|error| match error {
                ConvertError::Ingest(source) => ConvertError::File {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })
    }

    /// convert the CSV content of `source` using `build` for the build tag
    pub fn convert_reader<R: Read, W: Write>(
        &self,
        source: R,
        build: &str,
        timestamp: i64,
        output: &mut W,
    ) -> Result<Summary, ConvertError> {
        let mut records = RecordReader::new(source, build, timestamp, &self.settings)?;
        let mut lines = 0;

        for record in records.by_ref() {
            let line = self.protocol.serialize(&record?)?;

            writeln!(output, "{line}").map_err(SinkError::from)?;
            lines += 1;
        }

        Ok(Summary {
            files: 1,
            rows: records.rows(),
            skipped: records.skipped(),
            lines,
        })
    }
}
