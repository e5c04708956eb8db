use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Resolved type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    DateTime,
}

impl ColumnType {
    /// Maps an `xsi:type` tag from the cell stream onto a column type.
    ///
    /// The namespace prefix is ignored, so `xsd:double` and `double` are the
    /// same tag. Only the numeric tags are recognized, everything else
    /// (booleans and dates included) is a string unless overridden.
    pub fn from_xsd(tag: &str) -> ColumnType {
        let local = tag.rsplit(':').next().unwrap_or(tag);
        match local {
            "int" | "integer" => ColumnType::Int32,
            "short" => ColumnType::Int16,
            "long" => ColumnType::Int64,
            "double" => ColumnType::Double,
            "float" => ColumnType::Float,
            "decimal" => ColumnType::Decimal,
            _ => ColumnType::String,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Byte => "byte",
            ColumnType::Int16 => "int16",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal",
            ColumnType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "ansistring" | "text" => Ok(ColumnType::String),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "byte" => Ok(ColumnType::Byte),
            "int16" | "short" => Ok(ColumnType::Int16),
            "int32" | "int" => Ok(ColumnType::Int32),
            "int64" | "long" => Ok(ColumnType::Int64),
            "float" | "single" => Ok(ColumnType::Float),
            "double" => Ok(ColumnType::Double),
            "decimal" => Ok(ColumnType::Decimal),
            "datetime" | "date" => Ok(ColumnType::DateTime),
            _ => Err(format!("Unknown column type: {}", s)),
        }
    }
}
