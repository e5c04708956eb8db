//! Entry point for decoding an XML for Analysis `mddataset` response.
//!
//! Typical shape (namespace `urn:schemas-microsoft-com:xml-analysis:mddataset`):
//!
//! ```text
//! <root>
//!   <Axes>
//!     <Axis name="Axis0"> <Tuples> <Tuple> <Member>...</Member> </Tuple> </Tuples> </Axis>
//!     <Axis name="Axis1"> ... </Axis>
//!   </Axes>
//!   <CellData>
//!     <Cell CellOrdinal="0"> <Value xsi:type="xsd:double">96</Value> <FmtValue>96</FmtValue> </Cell>
//!   </CellData>
//! </root>
//! ```
//!
//! Elements are matched by local name, so the dataset may be embedded in a
//! SOAP envelope or use any namespace prefix.

use crate::axis::{self, Tuple};
use crate::cell::{self, Cell};
use log::debug;
use roxmltree::{Document, Node};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Missing attribute {attribute} on element {element}")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid number in {element}: {value:?}")]
    InvalidNumber { element: String, value: String },

    #[error("Duplicate cell ordinal: {0}")]
    DuplicateCellOrdinal(usize),

    #[error("Row tuple {tuple} has {found} members, expected {expected}")]
    RaggedRowAxis {
        tuple: usize,
        expected: usize,
        found: usize,
    },
}

/// The decoded content of one query response.
#[derive(Debug, Clone, PartialEq)]
pub struct MdDataset {
    /// Tuples of `Axis1`, empty when nothing was placed on rows.
    pub rows: Vec<Tuple>,
    /// Tuples of `Axis0`.
    pub columns: Vec<Tuple>,
    /// Non-null cells in document order.
    pub cells: Vec<Cell>,
}

pub fn parse_dataset(xml: &str) -> Result<MdDataset, DocumentError> {
    let doc = Document::parse(xml)?;
    let dataset = doc
        .descendants()
        .find(|n| is_element(n, "Axes"))
        .and_then(|axes| axes.parent_element())
        .ok_or_else(|| DocumentError::MissingElement("Axes".to_string()))?;

    let (rows, columns) = axis::parse_axes(dataset)?;
    let cells = cell::parse_cells(dataset)?;

    debug!(
        "Parsed dataset: {} row tuples, {} column tuples, {} cells",
        rows.len(),
        columns.len(),
        cells.len()
    );

    Ok(MdDataset {
        rows,
        columns,
        cells,
    })
}

pub(crate) fn is_element(node: &Node<'_, '_>, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local
}

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_element(n, local))
}

pub(crate) fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is_element(n, local))
}

pub(crate) fn required_child<'a, 'input>(
    node: Node<'a, 'input>,
    local: &str,
) -> Result<Node<'a, 'input>, DocumentError> {
    child(node, local).ok_or_else(|| DocumentError::MissingElement(local.to_string()))
}

/// Text content of an element, empty for `<Caption/>`.
pub(crate) fn text(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().to_string()
}

/// Looks up an attribute by local name, ignoring its namespace.
pub(crate) fn attribute<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name() == local)
        .map(|attr| attr.value())
}
