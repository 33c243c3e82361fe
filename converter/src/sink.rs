use std::{
    fs::File,
    io::{self, BufWriter, Stdout, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to create output file {path:?}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write line protocol")]
    Write(#[from] io::Error),
}

/// Destination of the generated line protocol
#[derive(Debug)]
pub enum Sink {
    Stdout(BufWriter<Stdout>),
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
}

impl Sink {
    /// open `path` for writing, truncating it, or fall back to stdout
    pub fn open(path: Option<&Path>) -> Result<Self, SinkError> {
        match path {
            Some(path) => {
                let file = File::create(path).map_err(|source| SinkError::Create {
                    path: path.to_path_buf(),
                    source,
                })?;

                debug!(path = ?path, "Opened output file");

                Ok(Self::File {
                    path: path.to_path_buf(),
                    writer: BufWriter::new(file),
                })
            }
            None => Ok(Self::Stdout(BufWriter::new(io::stdout()))),
        }
    }

    /// flush all buffered lines and release the destination
    pub fn close(mut self) -> Result<(), SinkError> {
        self.flush()?;

        match self {
            Self::Stdout(_) => debug!("Flushed stdout"),
            Self::File { path, .. } => info!(path = ?path, "Closed output file"),
        }

        Ok(())
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(writer) => writer.write(buf),
            Self::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(writer) => writer.flush(),
            Self::File { writer, .. } => writer.flush(),
        }
    }
}
