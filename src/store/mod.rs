mod record;

pub use record::{split_records, Record, RecordEntry, RECORD_SEPARATOR};

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures reading or writing the record file
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to record data: {source} ({})", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read records: {source} ({})", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Append-only text file of completed sessions
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record followed by a blank line.
    pub fn append(&self, record: &Record) -> Result<(), StoreError> {
        let text = format!("{}{}", record.render(), RECORD_SEPARATOR);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.append_error(source))?;
        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| self.append_error(source))?;

        tracing::debug!(path = %self.path.display(), "record appended");
        Ok(())
    }

    /// Read every record text in file order. A missing file holds no records.
    pub fn load_all(&self) -> Result<Vec<String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "record file not created yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(split_records(&contents))
    }

    fn append_error(&self, source: io::Error) -> StoreError {
        StoreError::Append {
            path: self.path.clone(),
            source,
        }
    }
}
