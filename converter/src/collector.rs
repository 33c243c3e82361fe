use crate::config::ConverterConfig;
use globset::{GlobBuilder, GlobMatcher};
use ignore::{DirEntry, WalkBuilder};
use itertools::Itertools;
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_PATTERN: &str = "*.csv";

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Input directory {0:?} does not exist or is not a directory")]
    DirectoryNotFound(PathBuf),
    #[error("Globs were invalid")]
    InvalidGlob(#[from] globset::Error),
    #[error("Failed to list input directory")]
    Walk(#[from] ignore::Error),
}

#[derive(Debug)]
/// All possible sources of result files
/// Both yield their paths front to back, in the order the timestamps are assigned
pub enum Collector {
    /// files of a directory matching a glob, sorted by name
    Glob { paths: VecDeque<PathBuf> },
    /// files given by the user, in the given order
    Explicit { paths: VecDeque<PathBuf> },
}

/// compile a file name pattern, `*` does not cross directory separators
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
}

impl Collector {
    pub fn load(config: &ConverterConfig) -> Result<Self, CollectorError> {
        if config.files.is_empty() {
            Self::scan(&config.directory, &config.pattern)
        } else {
            if config.directory != Path::new(".") {
                warn!("Explicit input files given, ignoring directory {:?}", config.directory);
            }

            Ok(Self::explicit(config.files.iter().cloned()))
        }
    }

    pub fn explicit<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        Self::Explicit {
            paths: paths.into_iter().collect(),
        }
    }

    /// list the files directly inside `directory` whose name matches `pattern`
    pub fn scan(directory: &Path, pattern: &str) -> Result<Self, CollectorError> {
        if !directory.is_dir() {
            return Err(CollectorError::DirectoryNotFound(directory.to_path_buf()));
        }

        let glob = compile_pattern(pattern)?;
        let mut builder = WalkBuilder::new(directory);

        debug!("Filtering with glob: {glob:?}");
        // plain listing: no recursion, hidden files included, no ignore files
        builder.standard_filters(false).max_depth(Some(1));

        let paths = builder
            .build()
            .filter_ok(|entry| entry.depth() > 0 && glob.is_match(entry.file_name()))
            // follows symlinks, a linked result file counts like a regular one
            .filter_ok(|entry| {
                let is_file = entry.path().is_file();

                if !is_file {
                    warn!(path = ?entry.path(), "Skipping matching entry that is not a file");
                }

                is_file
            })
            .map_ok(DirEntry::into_path)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Glob {
            paths: paths.into_iter().sorted().collect(),
        })
    }

    pub fn paths(&self) -> &VecDeque<PathBuf> {
        match self {
            Self::Glob { paths } | Self::Explicit { paths } => paths,
        }
    }
}

impl Iterator for Collector {
    type Item = PathBuf;

    /// return accurate size for underlying iterator
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.paths().len();

        (len, Some(len))
    }

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Glob { paths } | Self::Explicit { paths } => paths.pop_front(),
        }
    }
}

impl ExactSizeIterator for Collector {}
