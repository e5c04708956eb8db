use crate::column_map::{resolve_directives, substitute, ColumnMapping, Directive, MappingError};
use crate::document::{parse_dataset, DocumentError};
use crate::materializer::materialize_rows;
use crate::result_set::{ResultSet, ResultSetError};
use crate::schema::build_schema;
use crate::source::{CubeSource, SourceError};
use crate::value::{CoercionError, Value};
use log::{debug, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdxError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    ResultSet(#[from] ResultSetError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Turns one XMLA `mddataset` response into a flat, typed [`ResultSet`].
///
/// Pure: the same document and mapping always produce the same result.
pub fn materialize(xml: &str, mapping: &ColumnMapping) -> Result<ResultSet, MdxError> {
    let dataset = parse_dataset(xml)?;
    let schema = build_schema(&dataset, mapping)?;
    let rows = materialize_rows(&dataset, &schema)?;
    debug!(
        "Materialized {} columns x {} rows",
        schema.columns.len(),
        rows.len()
    );
    Ok(ResultSet::new(schema.columns, rows))
}

/// A query ready to send, with its column mapping already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCommand {
    pub query_text: String,
    pub mapping: ColumnMapping,
}

/// An MDX query plus the directives that shape its result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdxCommand {
    query: String,
    directives: Vec<Directive>,
}

impl MdxCommand {
    pub fn new(query: impl Into<String>) -> Self {
        MdxCommand {
            query: query.into(),
            directives: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn add_directive(&mut self, directive: Directive) -> &mut Self {
        self.directives.push(directive);
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn with_directives(mut self, directives: impl IntoIterator<Item = Directive>) -> Self {
        self.directives.extend(directives);
        self
    }

    /// Splits the directives and substitutes the parameters into the query.
    pub fn prepare(&self) -> PreparedCommand {
        let (mapping, parameters) = resolve_directives(&self.directives);
        PreparedCommand {
            query_text: substitute(&self.query, &parameters),
            mapping,
        }
    }

    pub fn execute<S: CubeSource>(&self, source: &S) -> Result<ResultSet, MdxError> {
        let prepared = self.prepare();
        info!("Executing query: {:?}", prepared.query_text);
        let xml = source.execute_xml(&prepared.query_text)?;
        materialize(&xml, &prepared.mapping)
    }

    /// First value of the first row, `None` when the result has no rows.
    pub fn execute_scalar<S: CubeSource>(&self, source: &S) -> Result<Option<Value>, MdxError> {
        let result = self.execute(source)?;
        Ok(result.value(0, 0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_splits_directives() {
        let command = MdxCommand::new("SELECT [Measures].[Score] ON 0 FROM [Cube] WHERE [Date].[Year].&[@Year]")
            .with_directive(Directive::new("@Year", 2024))
            .with_directive(Directive::new("~0", "Score"));

        let prepared = command.prepare();
        assert_eq!(
            prepared.query_text,
            "SELECT [Measures].[Score] ON 0 FROM [Cube] WHERE [Date].[Year].&[2024]"
        );
        assert_eq!(prepared.mapping.rules().len(), 1);
        assert_eq!(prepared.mapping.rules()[0].target, "Score");
    }

    #[test]
    fn test_add_directive_in_place() {
        let mut command = MdxCommand::new("SELECT FROM [Cube]");
        command
            .add_directive(Directive::new("~0", "A"))
            .add_directive(Directive::new("~1", "B"));
        assert_eq!(command.directives().len(), 2);
        assert_eq!(command.query(), "SELECT FROM [Cube]");
    }

    #[test]
    fn test_materialize_rejects_garbage() {
        let err = materialize("not xml", &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, MdxError::Document(DocumentError::Xml(_))));
    }
}
