//! Owned table tree extracted from a parsed HTML document.
//!
//! The parsed DOM is not thread-safe, so everything the layout engine needs
//! is copied out into these plain structures once, on the parsing thread.

use smallvec::SmallVec;

/// Stable identity of a `<table>` element inside its document.
pub type TableId = ego_tree::NodeId;

/// One `<table>` element and everything the layout engine reads from it.
#[derive(Debug, Clone)]
pub struct TableNode {
    /// Identity of the element in the parsed document
    pub id: TableId,
    /// Nesting level; top-level tables are level 0
    pub depth: usize,
    /// Rows in document order, hidden ones included
    pub rows: Vec<RowNode>,
    /// Set when extraction stopped at the depth limit and `rows` is empty
    pub truncated: bool,
}

impl TableNode {
    /// Rows that take part in layout.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &RowNode)> {
        self.rows.iter().enumerate().filter(|(_, row)| !row.hidden)
    }

    /// Number of tables in this subtree, this one included.
    pub fn table_count(&self) -> usize {
        1 + self
            .rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .flat_map(|cell| cell.nested_tables())
            .map(TableNode::table_count)
            .sum::<usize>()
    }
}

/// One `<tr>` element.
#[derive(Debug, Clone, Default)]
pub struct RowNode {
    /// Presentational attributes and inline style of the row
    pub attributes: StyleAttributes,
    /// Whether the row's inline style hides it
    pub hidden: bool,
    /// `<td>`/`<th>` children in document order
    pub cells: SmallVec<[CellNode; 8]>,
}

/// Cell element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    #[default]
    Data,
    Header,
}

/// One `<td>` or `<th>` element.
#[derive(Debug, Clone, Default)]
pub struct CellNode {
    pub kind: CellKind,
    /// Declared rowspan, at least 1
    pub rowspan: u32,
    /// Declared colspan, at least 1
    pub colspan: u32,
    /// Presentational attributes and inline style of the cell
    pub attributes: StyleAttributes,
    /// Content as a vertical stack of text runs and nested tables
    pub blocks: Vec<CellBlock>,
}

impl CellNode {
    /// Tables hosted directly by this cell.
    pub fn nested_tables(&self) -> impl Iterator<Item = &TableNode> {
        self.blocks.iter().filter_map(|block| match block {
            CellBlock::Table(table) => Some(table),
            CellBlock::Text(_) => None,
        })
    }

    /// Whether this cell hosts at least one nested table.
    pub fn has_nested_tables(&self) -> bool {
        self.nested_tables().next().is_some()
    }

    /// All text runs joined by line breaks.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for block in &self.blocks {
            if let CellBlock::Text(run) = block {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(run);
            }
        }
        text
    }
}

/// A piece of cell content.
#[derive(Debug, Clone)]
pub enum CellBlock {
    /// Unescaped, whitespace-collapsed text; lines separated by `\n`
    Text(String),
    /// A table nested inside the cell
    Table(TableNode),
}

/// Style sources of an element, kept raw until the style cache sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StyleAttributes {
    /// Inline `style` attribute
    pub style: Option<String>,
    /// `bgcolor` attribute
    pub bgcolor: Option<String>,
    /// `align` attribute
    pub align: Option<String>,
    /// `valign` attribute
    pub valign: Option<String>,
    /// `width` attribute
    pub width: Option<String>,
}

impl StyleAttributes {
    pub fn is_empty(&self) -> bool {
        self.style.is_none()
            && self.bgcolor.is_none()
            && self.align.is_none()
            && self.valign.is_none()
            && self.width.is_none()
    }
}
