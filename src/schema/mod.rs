pub mod column_type;
pub mod inference;

use crate::column_map::{ColumnIdentity, ColumnMapping, MappingError, PropertyRule};
use crate::document::MdDataset;
use log::debug;
use serde::Serialize;

pub use column_type::ColumnType;
pub use inference::infer_column_type;

/// Where a column's values come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Caption of the row-tuple member at `position`.
    RowLevel { position: usize },
    /// A dimension property of the row-tuple member at `position`.
    DimensionProperty { position: usize, property: String },
    /// Data cells of the column-axis tuple at `tuple` (0-based).
    Data { tuple: usize },
    /// A member field pulled out by a property rule.
    MemberProperty { rule: usize, property: PropertyRule },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Position in the output table.
    pub ordinal: usize,
    /// 1-based position among the column-axis tuples, data columns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_ordinal_base: Option<usize>,
    #[serde(skip)]
    pub source: ColumnSource,
}

/// The resolved column list of one result.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn data_column_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| matches!(c.source, ColumnSource::Data { .. }))
            .count()
    }

    /// Index of the first data column.
    pub fn data_offset(&self) -> usize {
        self.columns
            .iter()
            .position(|c| matches!(c.source, ColumnSource::Data { .. }))
            .unwrap_or(self.columns.len())
    }
}

struct Draft {
    default_name: String,
    underlying: String,
    source: ColumnSource,
}

pub fn build_schema(dataset: &MdDataset, mapping: &ColumnMapping) -> Result<Schema, MappingError> {
    let mut drafts = Vec::new();

    if let Some(first) = dataset.rows.first() {
        for (position, member) in first.members.iter().enumerate() {
            drafts.push(Draft {
                default_name: member.level_name.clone(),
                underlying: member.level_name.clone(),
                source: ColumnSource::RowLevel { position },
            });
        }
    }

    // Properties can be level dependent (only leaves of a parent-child
    // hierarchy carry some of them), so every row tuple is scanned.
    let mut property_keys: Vec<(usize, &str)> = Vec::new();
    for tuple in &dataset.rows {
        for (position, member) in tuple.members.iter().enumerate() {
            for property in &member.dimension_properties {
                let key = (position, property.name.as_str());
                if !property_keys.contains(&key) {
                    property_keys.push(key);
                }
            }
        }
    }
    for (position, name) in &property_keys {
        drafts.push(Draft {
            default_name: name.to_string(),
            underlying: name.to_string(),
            source: ColumnSource::DimensionProperty {
                position: *position,
                property: name.to_string(),
            },
        });
    }

    for (tuple_index, tuple) in dataset.columns.iter().enumerate() {
        let unique_name = tuple.unique_name();
        drafts.push(Draft {
            default_name: unique_name.clone(),
            underlying: unique_name,
            source: ColumnSource::Data { tuple: tuple_index },
        });
    }

    let mut used = vec![false; mapping.rules().len()];
    for (index, rule, property) in mapping.property_rules() {
        let satisfied = property_keys.iter().any(|(_, name)| *name == rule.text);
        if satisfied {
            continue;
        }
        used[index] = true;
        drafts.push(Draft {
            default_name: rule.target.clone(),
            underlying: rule.text.clone(),
            source: ColumnSource::MemberProperty {
                rule: index,
                property: property.clone(),
            },
        });
    }

    let column_count = dataset.columns.len();
    let mut columns = Vec::with_capacity(drafts.len());
    for (ordinal, draft) in drafts.into_iter().enumerate() {
        let resolution = mapping.resolve(ColumnIdentity {
            underlying: &draft.underlying,
            default_name: &draft.default_name,
            ordinal,
        })?;
        for index in &resolution.matched {
            used[*index] = true;
        }

        let column_type = match (resolution.column_type, &draft.source) {
            (Some(explicit), _) => explicit,
            (None, ColumnSource::Data { tuple }) => {
                infer_column_type(&dataset.cells, tuple + 1, column_count)
            }
            (None, ColumnSource::MemberProperty { property, .. }) => property.token.default_type(),
            (None, _) => ColumnType::String,
        };
        let cell_ordinal_base = match draft.source {
            ColumnSource::Data { tuple } => Some(tuple + 1),
            _ => None,
        };

        columns.push(Column {
            name: resolution.name.unwrap_or(draft.default_name),
            column_type,
            ordinal,
            cell_ordinal_base,
            source: draft.source,
        });
    }

    for (rule, used) in mapping.rules().iter().zip(&used) {
        if !used {
            debug!("Column mapping rule {:?} matched no column", rule.text);
        }
    }

    Ok(Schema { columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{DimensionProperty, Member, Tuple};
    use crate::cell::Cell;
    use crate::column_map::{resolve_directives, Directive};

    fn member(level: &str, caption: &str, properties: &[(&str, &str)]) -> Member {
        Member {
            caption: caption.to_string(),
            unique_name: format!("{}.&[{}]", level, caption),
            level_name: level.to_string(),
            level_number: Some(1),
            dimension_properties: properties
                .iter()
                .map(|(name, value)| DimensionProperty {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    fn measure(name: &str) -> Tuple {
        Tuple {
            members: vec![Member {
                caption: name.to_string(),
                unique_name: format!("[Measures].[{}]", name),
                level_name: "[Measures].[MeasuresLevel]".to_string(),
                level_number: Some(0),
                dimension_properties: vec![],
            }],
        }
    }

    fn cell(ordinal: usize, tag: &str) -> Cell {
        Cell {
            ordinal,
            value: "1".to_string(),
            formatted_value: "1".to_string(),
            type_tag: Some(tag.to_string()),
        }
    }

    fn dataset() -> MdDataset {
        MdDataset {
            rows: vec![
                Tuple {
                    members: vec![member("[Org].[Region]", "North", &[])],
                },
                Tuple {
                    members: vec![member("[Org].[Team]", "Blue", &[("[Org].[Team].[Key]", "B1")])],
                },
            ],
            columns: vec![measure("Score"), measure("Count")],
            cells: vec![
                cell(0, "xsd:double"),
                cell(1, "xsd:int"),
                cell(2, "xsd:int"),
                cell(3, "xsd:int"),
            ],
        }
    }

    fn names(schema: &Schema) -> Vec<&str> {
        schema.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_default_columns() {
        let schema = build_schema(&dataset(), &ColumnMapping::default()).unwrap();
        assert_eq!(
            names(&schema),
            vec![
                "[Org].[Region]",
                "[Org].[Team].[Key]",
                "[Measures].[Score]",
                "[Measures].[Count]"
            ]
        );
        let types: Vec<ColumnType> = schema.columns.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::String,
                ColumnType::Double,
                ColumnType::Int32
            ]
        );
        let bases: Vec<Option<usize>> = schema.columns.iter().map(|c| c.cell_ordinal_base).collect();
        assert_eq!(bases, vec![None, None, Some(1), Some(2)]);
        assert_eq!(schema.data_offset(), 2);
        assert_eq!(schema.data_column_count(), 2);
    }

    #[test]
    fn test_renames_and_overrides() {
        let (mapping, _) = resolve_directives(&[
            Directive::new("~0", "Region"),
            Directive::new("~[Measures].[Count]", "Count").with_type(ColumnType::Int64),
            Directive::new("~[Org].[Team].[Key]", "TeamKey"),
            Directive::new("~[Measures].[Missing]", "Unused"),
        ]);
        let schema = build_schema(&dataset(), &mapping).unwrap();
        assert_eq!(
            names(&schema),
            vec!["Region", "TeamKey", "[Measures].[Score]", "Count"]
        );
        assert_eq!(schema.columns[3].column_type, ColumnType::Int64);
    }

    #[test]
    fn test_explicit_type_on_row_level_column() {
        let (mapping, _) =
            resolve_directives(&[Directive::new("~[Org].[Region]", "Region").with_type(ColumnType::Int32)]);
        let schema = build_schema(&dataset(), &mapping).unwrap();
        assert_eq!(schema.columns[0].column_type, ColumnType::Int32);
    }

    #[test]
    fn test_property_rule_appends_column() {
        let (mapping, _) = resolve_directives(&[
            Directive::new("~[Org].[Team]##UniqueName##", "TeamId"),
            Directive::new("~0##LevelNumber##", "Depth"),
        ]);
        let schema = build_schema(&dataset(), &mapping).unwrap();
        assert_eq!(schema.columns.len(), 6);
        assert_eq!(schema.columns[4].name, "TeamId");
        assert_eq!(schema.columns[4].column_type, ColumnType::String);
        assert_eq!(schema.columns[5].name, "Depth");
        assert_eq!(schema.columns[5].column_type, ColumnType::Int32);
        assert_eq!(schema.columns[5].ordinal, 5);
    }

    #[test]
    fn test_property_rule_satisfied_by_dimension_property() {
        let dataset = MdDataset {
            rows: vec![Tuple {
                members: vec![member("[Org].[Team]", "Blue", &[("[Org].[Team]##Caption##", "x")])],
            }],
            columns: vec![measure("Score")],
            cells: vec![],
        };
        let (mapping, _) = resolve_directives(&[Directive::new("~[Org].[Team]##Caption##", "Renamed")]);
        let schema = build_schema(&dataset, &mapping).unwrap();
        assert_eq!(names(&schema), vec!["[Org].[Team]", "Renamed", "[Measures].[Score]"]);
    }

    #[test]
    fn test_no_row_axis() {
        let dataset = MdDataset {
            rows: vec![],
            columns: vec![measure("Score")],
            cells: vec![cell(0, "xsd:double")],
        };
        let schema = build_schema(&dataset, &ColumnMapping::default()).unwrap();
        assert_eq!(names(&schema), vec!["[Measures].[Score]"]);
        assert_eq!(schema.columns[0].column_type, ColumnType::Double);
        assert_eq!(schema.data_offset(), 0);
    }
}
