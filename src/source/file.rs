use super::{CubeSource, SourceError};
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Replays a captured XMLA response from disk.
///
/// Every query answers with the same document, which makes the source useful
/// for offline inspection of a response and for tests.
#[derive(Debug, Clone)]
pub struct FileCubeSource {
    path: PathBuf,
}

impl FileCubeSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileCubeSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CubeSource for FileCubeSource {
    fn execute_xml(&self, query: &str) -> Result<String, SourceError> {
        info!("Replaying {} for query: {:?}", self.path.display(), query);
        let xml = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::FileNotFound(self.path.clone()),
            _ => SourceError::Io {
                path: self.path.clone(),
                source: e,
            },
        })?;
        debug!("Read {} bytes from {}", xml.len(), self.path.display());
        Ok(xml)
    }
}
