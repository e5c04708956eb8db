pub mod file;

pub use file::FileCubeSource;

use std::path::PathBuf;
use thiserror::Error;

/// CubeSource runs an MDX query and returns the raw XMLA response
///
/// The response is the `mddataset` document (optionally still wrapped in its
/// SOAP envelope). Connection handling, sessions and retries belong to the
/// implementor; materialization only ever sees the returned text.
pub trait CubeSource {
    fn execute_xml(&self, query: &str) -> Result<String, SourceError>;
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Query failed: {0}")]
    QueryError(String),
}
