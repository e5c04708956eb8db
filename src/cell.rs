use crate::document::{self, DocumentError};
use roxmltree::Node;
use std::collections::BTreeSet;

/// One non-null data point from the cell stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Position in the flattened, row-major cell space. Gaps are null cells
    /// the server did not transmit.
    pub ordinal: usize,
    pub value: String,
    pub formatted_value: String,
    /// `xsi:type` of the `Value` element, e.g. `xsd:double`.
    pub type_tag: Option<String>,
}

pub(crate) fn parse_cells(dataset: Node<'_, '_>) -> Result<Vec<Cell>, DocumentError> {
    let cell_data = document::required_child(dataset, "CellData")?;

    let mut seen = BTreeSet::new();
    let mut cells = Vec::new();
    for node in document::children(cell_data, "Cell") {
        let cell = parse_cell(node)?;
        if !seen.insert(cell.ordinal) {
            return Err(DocumentError::DuplicateCellOrdinal(cell.ordinal));
        }
        cells.push(cell);
    }

    Ok(cells)
}

fn parse_cell(node: Node<'_, '_>) -> Result<Cell, DocumentError> {
    let raw_ordinal =
        document::attribute(node, "CellOrdinal").ok_or_else(|| DocumentError::MissingAttribute {
            element: "Cell".to_string(),
            attribute: "CellOrdinal".to_string(),
        })?;
    let ordinal = raw_ordinal
        .trim()
        .parse::<usize>()
        .map_err(|_| DocumentError::InvalidNumber {
            element: "CellOrdinal".to_string(),
            value: raw_ordinal.to_string(),
        })?;

    let value_node = document::required_child(node, "Value")?;
    let value = document::text(value_node);
    let formatted_value = document::child(node, "FmtValue")
        .map(document::text)
        .unwrap_or_else(|| value.clone());
    let type_tag = document::attribute(value_node, "type").map(str::to_string);

    Ok(Cell {
        ordinal,
        value,
        formatted_value,
        type_tag,
    })
}
