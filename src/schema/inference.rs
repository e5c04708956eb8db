use super::ColumnType;
use crate::cell::Cell;
use log::debug;
use std::collections::BTreeSet;

/// Infers the type of the data column at 1-based `position` out of
/// `column_count` column-axis tuples.
///
/// The cell space is row-major, so cell `ordinal` lands in data column
/// `ordinal % column_count` of row `ordinal / column_count`. Every cell of
/// the column, across all rows, votes with its type tag:
///
/// - one distinct tag: that tag's type
/// - several tags, one of them absent: string, since an untyped cell means the
///   column's domain is unknown
/// - several tags, none absent: double if one of them is a double tag,
///   otherwise int32
/// - no cells at all: string
pub fn infer_column_type(cells: &[Cell], position: usize, column_count: usize) -> ColumnType {
    if column_count == 0 || position == 0 {
        return ColumnType::String;
    }
    let index = (position - 1) % column_count;

    let tags: BTreeSet<Option<&str>> = cells
        .iter()
        .filter(|cell| cell.ordinal % column_count == index)
        .map(|cell| cell.type_tag.as_deref())
        .collect();

    let inferred = match tags.len() {
        0 => ColumnType::String,
        1 => tags
            .iter()
            .next()
            .copied()
            .flatten()
            .map_or(ColumnType::String, ColumnType::from_xsd),
        _ if tags.contains(&None) => ColumnType::String,
        _ if tags
            .iter()
            .flatten()
            .any(|t| ColumnType::from_xsd(t) == ColumnType::Double) =>
        {
            ColumnType::Double
        }
        _ => ColumnType::Int32,
    };

    debug!(
        "Inferred {} for data column {} of {} from tags {:?}",
        inferred, position, column_count, tags
    );
    inferred
}
