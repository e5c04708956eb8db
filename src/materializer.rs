use crate::axis::Tuple;
use crate::cell::Cell;
use crate::column_map::PropertyRule;
use crate::document::MdDataset;
use crate::result_set::Row;
use crate::schema::{ColumnSource, ColumnType, Schema};
use crate::value::{coerce, CoercionError, Value};
use log::{debug, warn};

/// Builds the dense rows of a result from the sparse cell stream.
pub fn materialize_rows(dataset: &MdDataset, schema: &Schema) -> Result<Vec<Row>, CoercionError> {
    if dataset.rows.is_empty() {
        return materialize_single_row(dataset, schema);
    }

    let data_columns = schema.data_column_count();
    let mut cells: Vec<&Cell> = dataset.cells.iter().collect();
    cells.sort_by_key(|cell| cell.ordinal);

    let mut cursor = 0;
    let mut rows = Vec::with_capacity(dataset.rows.len());
    for (row_index, tuple) in dataset.rows.iter().enumerate() {
        let mut row = RowBuilder::with_capacity(schema.columns.len());
        for column in &schema.columns {
            match &column.source {
                ColumnSource::RowLevel { position } => {
                    let caption = &tuple.members[*position].caption;
                    row.push_text(caption, caption, column.column_type)?;
                }
                ColumnSource::DimensionProperty { position, property } => {
                    match tuple.members[*position].property(property) {
                        Some(value) => row.push_text(value, value, column.column_type)?,
                        None => row.push_null(),
                    }
                }
                ColumnSource::Data { tuple: index } => {
                    // The cell stream and the expected ordinals both increase,
                    // so a gap in the stream is a null and the cursor waits.
                    let expected = row_index * data_columns + index;
                    match cells.get(cursor) {
                        Some(cell) if cell.ordinal == expected => {
                            row.push_text(&cell.value, &cell.formatted_value, column.column_type)?;
                            cursor += 1;
                        }
                        _ => row.push_null(),
                    }
                }
                ColumnSource::MemberProperty { property, .. } => {
                    match member_value(tuple, property) {
                        Some(value) => row.push_text(&value, &value, column.column_type)?,
                        None => row.push_null(),
                    }
                }
            }
        }
        rows.push(row.finish());
    }

    if cursor < cells.len() {
        warn!(
            "{} cells lie outside the {} x {} cell space and were ignored",
            cells.len() - cursor,
            dataset.rows.len(),
            data_columns
        );
    }
    debug!("Materialized {} rows", rows.len());

    Ok(rows)
}

/// Nothing on the row axis: every cell belongs to one synthetic row.
fn materialize_single_row(dataset: &MdDataset, schema: &Schema) -> Result<Vec<Row>, CoercionError> {
    if dataset.cells.is_empty() {
        return Ok(Vec::new());
    }

    let data_columns = schema.data_column_count();
    let offset = schema.data_offset();
    let mut values = vec![Value::Null; schema.columns.len()];
    let mut formatted = vec![None; schema.columns.len()];
    for cell in &dataset.cells {
        if cell.ordinal >= data_columns {
            warn!(
                "Cell ordinal {} is outside the {} data columns and was ignored",
                cell.ordinal, data_columns
            );
            continue;
        }
        let index = offset + cell.ordinal;
        values[index] = coerce(&cell.value, schema.columns[index].column_type)?;
        formatted[index] = Some(cell.formatted_value.clone());
    }

    Ok(vec![Row { values, formatted }])
}

fn member_value(tuple: &Tuple, property: &PropertyRule) -> Option<String> {
    tuple
        .members
        .iter()
        .enumerate()
        .find(|(position, member)| property.member.matches(*position, member))
        .and_then(|(_, member)| property.token.extract(member))
}

struct RowBuilder {
    values: Vec<Value>,
    formatted: Vec<Option<String>>,
}

impl RowBuilder {
    fn with_capacity(capacity: usize) -> Self {
        RowBuilder {
            values: Vec::with_capacity(capacity),
            formatted: Vec::with_capacity(capacity),
        }
    }

    fn push_text(&mut self, raw: &str, formatted: &str, column_type: ColumnType) -> Result<(), CoercionError> {
        self.values.push(coerce(raw, column_type)?);
        self.formatted.push(Some(formatted.to_string()));
        Ok(())
    }

    fn push_null(&mut self) {
        self.values.push(Value::Null);
        self.formatted.push(None);
    }

    fn finish(self) -> Row {
        Row {
            values: self.values,
            formatted: self.formatted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Member;
    use crate::column_map::{resolve_directives, ColumnMapping, Directive};
    use crate::schema::build_schema;

    fn member(level: &str, caption: &str) -> Member {
        Member {
            caption: caption.to_string(),
            unique_name: format!("{}.&[{}]", level, caption),
            level_name: level.to_string(),
            level_number: Some(2),
            dimension_properties: vec![],
        }
    }

    fn measure(name: &str) -> Tuple {
        Tuple {
            members: vec![member("[Measures].[MeasuresLevel]", name)],
        }
    }

    fn cell(ordinal: usize, value: &str) -> Cell {
        Cell {
            ordinal,
            value: value.to_string(),
            formatted_value: format!("#{}", value),
            type_tag: Some("xsd:int".to_string()),
        }
    }

    fn rows_for(dataset: &MdDataset, mapping: &ColumnMapping) -> Vec<Row> {
        let schema = build_schema(dataset, mapping).unwrap();
        materialize_rows(dataset, &schema).unwrap()
    }

    #[test]
    fn test_gaps_become_nulls() {
        let dataset = MdDataset {
            rows: vec![
                Tuple { members: vec![member("[P].[Name]", "a")] },
                Tuple { members: vec![member("[P].[Name]", "b")] },
            ],
            columns: vec![measure("X"), measure("Y")],
            cells: vec![cell(3, "4"), cell(0, "1")],
        };
        let rows = rows_for(&dataset, &ColumnMapping::default());

        assert_eq!(rows[0].values, vec![Value::String("a".into()), Value::Int32(1), Value::Null]);
        assert_eq!(rows[1].values, vec![Value::String("b".into()), Value::Null, Value::Int32(4)]);
        assert_eq!(rows[0].formatted, vec![Some("a".into()), Some("#1".into()), None]);
    }

    #[test]
    fn test_single_row_without_row_axis() {
        let dataset = MdDataset {
            rows: vec![],
            columns: vec![measure("X"), measure("Y"), measure("Z")],
            cells: vec![cell(2, "3"), cell(0, "1"), cell(7, "8")],
        };
        let rows = rows_for(&dataset, &ColumnMapping::default());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], Value::Int32(1));
        assert_eq!(rows[0].values[1], Value::Null);
        assert_eq!(rows[0].values[2], Value::Int32(3));
    }

    #[test]
    fn test_no_rows_and_no_cells() {
        let dataset = MdDataset {
            rows: vec![],
            columns: vec![measure("X")],
            cells: vec![],
        };
        assert!(rows_for(&dataset, &ColumnMapping::default()).is_empty());
    }

    #[test]
    fn test_member_property_columns() {
        let dataset = MdDataset {
            rows: vec![
                Tuple { members: vec![member("[P].[Group]", "g"), member("[P].[Name]", "a")] },
                Tuple { members: vec![member("[P].[Group]", "g"), member("[P].[Other]", "b")] },
            ],
            columns: vec![measure("X")],
            cells: vec![cell(0, "1"), cell(1, "2")],
        };
        let (mapping, _) = resolve_directives(&[
            Directive::new("~[P].[Name]##UniqueName##", "Code"),
            Directive::new("~0##LevelNumber##", "Depth"),
        ]);
        let rows = rows_for(&dataset, &mapping);

        assert_eq!(rows[0].values[3], Value::String("[P].[Name].&[a]".into()));
        assert_eq!(rows[0].values[4], Value::Int32(2));
        assert_eq!(rows[1].values[3], Value::Null);
        assert_eq!(rows[1].values[4], Value::Int32(2));
    }

    #[test]
    fn test_coercion_failure_is_fatal() {
        let dataset = MdDataset {
            rows: vec![Tuple { members: vec![member("[P].[Name]", "a")] }],
            columns: vec![measure("X")],
            cells: vec![cell(0, "not a number")],
        };
        let schema = build_schema(&dataset, &ColumnMapping::default()).unwrap();
        let err = materialize_rows(&dataset, &schema).unwrap_err();
        assert_eq!(err.target, ColumnType::Int32);
    }
}
