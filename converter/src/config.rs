use crate::{
    collector::{compile_pattern, DEFAULT_PATTERN},
    ingest::{CollisionPolicy, IngestSettings, DEFAULT_UNIT},
    protocol::{EscapeMode, LineProtocol, DEFAULT_MEASUREMENT},
};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config file {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to deserialize config")]
    Deserialize(#[from] serde_yaml::Error),
    #[error("Config failed preflight checks")]
    Preflight,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    // directory scanned for result files
    #[serde(default = "default_directory", alias = "dir")]
    pub directory: PathBuf,
    // file name glob applied while scanning
    #[serde(default = "default_pattern")]
    pub pattern: String,
    // explicit result files, replaces scanning when non-empty
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub escape: EscapeMode,
    #[serde(default, alias = "collision")]
    pub collisions: CollisionPolicy,

    // output file, stdout if missing
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            pattern: default_pattern(),
            files: Vec::new(),
            measurement: default_measurement(),
            unit: default_unit(),
            escape: EscapeMode::default(),
            collisions: CollisionPolicy::default(),
            output: None,
        }
    }
}

impl ConverterConfig {
    /// load a YAML config, keys missing from the file use their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let content = fs::read_to_string(path).map_err(|source| ConfigErrors::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigErrors> {
        // an empty document is a config with all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(content)?)
    }

    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            unit: self.unit.clone(),
            collisions: self.collisions,
        }
    }

    pub fn line_protocol(&self) -> LineProtocol {
        LineProtocol::new(self.measurement.clone(), self.escape)
    }

    /// Validate the merged configuration
    /// returns true if at least one error was found, every problem is logged
    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        if self.files.is_empty() {
            if !self.directory.is_dir() {
                error!(
                    "directory ({}) does not exist or is not a directory",
                    self.directory.to_string_lossy()
                );
                contains_error = true;
            }

            if let Err(error) = compile_pattern(&self.pattern) {
                error!("pattern ({}) is not a valid glob: {error}", self.pattern);
                contains_error = true;
            }
        } else {
            for file in self.files.iter() {
                if !file.is_file() {
                    error!(
                        "Failed to find input file {}. Either not a file or not found",
                        file.to_string_lossy()
                    );
                    contains_error = true;
                }
            }
        }

        if self.measurement.is_empty() {
            error!("measurement cannot be empty");
            contains_error = true;
        }

        if self.unit.is_empty() {
            error!("unit cannot be empty, no row would ever be converted");
            contains_error = true;
        }

        if self.escape == EscapeMode::Legacy
            && self
                .measurement
                .contains(|character: char| matches!(character, ',' | ' '))
        {
            warn!(
                "measurement `{}` contains reserved characters but escape is legacy",
                self.measurement
            );
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                error!("output ({}) is a directory", output.to_string_lossy());
                contains_error = true;
            }
        }

        contains_error
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_owned()
}

fn default_measurement() -> String {
    DEFAULT_MEASUREMENT.to_owned()
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_owned()
}
