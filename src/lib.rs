pub mod axis;
pub mod cell;
pub mod column_map;
pub mod command;
pub mod config;
pub mod document;
pub mod materializer;
pub mod result_set;
pub mod schema;
pub mod source;
pub mod value;


pub use column_map::{ColumnMapping, Directive, MappingError};
pub use command::{materialize, MdxCommand, MdxError, PreparedCommand};
pub use document::DocumentError;
pub use result_set::{ResultSet, ResultSetError, Row, RowCursor, SchemaRow};
pub use schema::{Column, ColumnType};
pub use source::{CubeSource, FileCubeSource, SourceError};
pub use value::{CoercionError, Value};
