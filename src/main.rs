use log::{error, info};
use std::fs;

use mdx_rowset::{config::Config, Directive, FileCubeSource, MdxCommand};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::new().map_err(|e| {
        error!("Failed to initialize config: {}", e);
        e
    })?;

    let directives: Vec<Directive> = match &config.directives_path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| {
                error!("Failed to read directives from {}: {}", path, e);
                e
            })?;
            serde_json::from_str(&json).map_err(|e| {
                error!("Invalid directives in {}: {}", path, e);
                e
            })?
        }
        None => Vec::new(),
    };

    let query = match &config.query_path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            error!("Failed to read query from {}: {}", path, e);
            e
        })?,
        None => String::new(),
    };

    let source = FileCubeSource::new(&config.document_path);
    let command = MdxCommand::new(query).with_directives(directives);
    let result = command.execute(&source).map_err(|e| {
        error!("Failed to materialize {}: {}", config.document_path, e);
        e
    })?;
    info!(
        "Materialized {} columns x {} rows",
        result.column_count(),
        result.row_count()
    );

    let output = if config.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);

    Ok(())
}
