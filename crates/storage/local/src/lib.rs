use std::{
    fs,
    path::{Path, PathBuf},
};

use meigen_core::{errors::SourceError, traits::QuoteSource};
use tracing::debug;

/// Default dataset location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/quotes.json";

/// Reads the dataset document from a file on every call.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH)
    }
}

impl QuoteSource for FileSource {
    fn read_raw(&self) -> Result<String, SourceError> {
        debug!(path = %self.path.display(), "reading dataset file");
        let bytes = fs::read(&self.path).map_err(SourceError::from)?;
        String::from_utf8(bytes).map_err(|e| {
            SourceError::Io(format!("{} is not valid utf-8: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
