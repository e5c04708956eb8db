use envconfig::Envconfig;
use log::debug;

#[derive(Envconfig)]
pub struct Config {
    /// Captured XMLA response to replay.
    #[envconfig(from = "MDX_DOCUMENT_PATH")]
    pub document_path: String,

    /// JSON array of directives, e.g. `[{"name": "~0", "value": "Store"}]`.
    #[envconfig(from = "MDX_DIRECTIVES_PATH")]
    pub directives_path: Option<String>,

    #[envconfig(from = "MDX_QUERY_PATH")]
    pub query_path: Option<String>,

    #[envconfig(from = "MDX_PRETTY", default = "true")]
    pub pretty: bool,
}

impl Config {
    pub fn new() -> Result<Self, envconfig::Error> {
        let config = Self::init_from_env()?;
        debug!(
            "Config loaded: document_path={}, directives_path={:?}, query_path={:?}, pretty={}",
            config.document_path, config.directives_path, config.query_path, config.pretty
        );
        Ok(config)
    }
}
