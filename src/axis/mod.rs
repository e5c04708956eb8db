pub mod xml_name;

use crate::document::{self, DocumentError};
use roxmltree::Node;
use xml_name::decode_name;

pub const COLUMN_AXIS: &str = "Axis0";
pub const ROW_AXIS: &str = "Axis1";

/// Member children that are member fields rather than dimension properties.
const MEMBER_FIELDS: [&str; 5] = ["UName", "Caption", "LName", "LNum", "DisplayInfo"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub caption: String,
    pub unique_name: String,
    pub level_name: String,
    pub level_number: Option<i32>,
    pub dimension_properties: Vec<DimensionProperty>,
}

impl Member {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.dimension_properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub members: Vec<Member>,
}

impl Tuple {
    /// Concatenated unique names of all members, the default name of a
    /// column-axis tuple.
    pub fn unique_name(&self) -> String {
        self.members
            .iter()
            .map(|m| m.unique_name.as_str())
            .collect()
    }
}

/// Reads the row and column axes under the dataset root.
///
/// Returns `(rows, columns)`. A missing row axis yields no rows; a missing
/// column axis is a malformed document.
pub(crate) fn parse_axes(dataset: Node<'_, '_>) -> Result<(Vec<Tuple>, Vec<Tuple>), DocumentError> {
    let axes = document::required_child(dataset, "Axes")?;

    let mut rows = None;
    let mut columns = None;
    for axis in document::children(axes, "Axis") {
        let name = document::attribute(axis, "name").ok_or_else(|| {
            DocumentError::MissingAttribute {
                element: "Axis".to_string(),
                attribute: "name".to_string(),
            }
        })?;
        match name {
            COLUMN_AXIS => columns = Some(parse_tuples(axis)?),
            ROW_AXIS => rows = Some(parse_tuples(axis)?),
            _ => {}
        }
    }

    let columns = columns.ok_or_else(|| DocumentError::MissingElement(COLUMN_AXIS.to_string()))?;
    let rows = rows.unwrap_or_default();
    check_row_shape(&rows)?;

    Ok((rows, columns))
}

fn parse_tuples(axis: Node<'_, '_>) -> Result<Vec<Tuple>, DocumentError> {
    let Some(tuples) = document::child(axis, "Tuples") else {
        return Ok(Vec::new());
    };

    document::children(tuples, "Tuple")
        .map(|tuple| {
            let members = document::children(tuple, "Member")
                .map(parse_member)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Tuple { members })
        })
        .collect()
}

fn parse_member(member: Node<'_, '_>) -> Result<Member, DocumentError> {
    let unique_name = document::text(document::required_child(member, "UName")?);
    let caption = document::text(document::required_child(member, "Caption")?);
    let level_name = document::text(document::required_child(member, "LName")?);
    let level_number = match document::child(member, "LNum") {
        Some(node) => {
            let raw = document::text(node);
            let number = raw
                .trim()
                .parse::<i32>()
                .map_err(|_| DocumentError::InvalidNumber {
                    element: "LNum".to_string(),
                    value: raw.clone(),
                })?;
            Some(number)
        }
        None => None,
    };

    let dimension_properties = member
        .children()
        .filter(|n| n.is_element() && !MEMBER_FIELDS.contains(&n.tag_name().name()))
        .map(|n| DimensionProperty {
            name: decode_name(n.tag_name().name()),
            value: decode_name(&document::text(n)),
        })
        .collect();

    Ok(Member {
        caption,
        unique_name,
        level_name,
        level_number,
        dimension_properties,
    })
}

fn check_row_shape(rows: &[Tuple]) -> Result<(), DocumentError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let expected = first.members.len();
    for (index, tuple) in rows.iter().enumerate() {
        if tuple.members.len() != expected {
            return Err(DocumentError::RaggedRowAxis {
                tuple: index,
                expected,
                found: tuple.members.len(),
            });
        }
    }
    Ok(())
}
