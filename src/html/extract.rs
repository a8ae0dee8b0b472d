//! Table extraction from a parsed HTML document.
//!
//! Walks every `<table>` in document order and copies it, with its rows,
//! cells and nested tables, into an owned [`TableNode`] tree. Each table
//! element is extracted at most once: nested tables are consumed by the
//! table hosting them and never come back as top-level tables.

use std::collections::HashSet;

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use smallvec::SmallVec;
use tracing::debug;

use super::node::{CellBlock, CellKind, CellNode, RowNode, StyleAttributes, TableId, TableNode};
use crate::config::ConvertOptions;
use crate::style::is_display_none;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("BUG: hardcoded CSS selector 'table' is invalid"));

/// Largest rowspan honored; browsers clamp at the same value.
pub const MAX_ROWSPAN: u32 = 65_534;
/// Largest colspan honored; browsers clamp at the same value.
pub const MAX_COLSPAN: u32 = 1_000;

/// Elements whose boundaries start a new line of cell text.
fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "li"
            | "ul"
            | "ol"
            | "dl"
            | "dt"
            | "dd"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "pre"
            | "blockquote"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "address"
            | "hr"
    )
}

/// Parse a `rowspan`/`colspan` value the way browsers do: leading digits
/// only, anything missing, zero or unreadable means 1.
fn parse_span(value: Option<&str>, max: u32) -> u32 {
    let Some(value) = value else {
        return 1;
    };
    let bytes = value.trim().as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return 1;
    }
    if digits > 9 {
        return max;
    }
    match atoi_simd::parse::<u32, false, false>(&bytes[..digits]) {
        Ok(0) | Err(_) => 1,
        Ok(span) => span.min(max),
    }
}

fn style_attributes(element: &ElementRef<'_>) -> StyleAttributes {
    let attr = |name: &str| element.value().attr(name).map(str::to_string);
    StyleAttributes {
        style: attr("style"),
        bgcolor: attr("bgcolor"),
        align: attr("align"),
        valign: attr("valign"),
        width: attr("width"),
    }
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    element.value().attr("hidden").is_some()
        || element.value().attr("style").is_some_and(is_display_none)
}

/// Extracts owned table trees from parsed documents.
///
/// One extractor serves one document: its visited set is what keeps nested
/// tables from being emitted a second time as top-level tables.
pub struct TableExtractor<'a> {
    options: &'a ConvertOptions,
    visited: HashSet<TableId>,
    hidden_tables: usize,
}

impl<'a> TableExtractor<'a> {
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self {
            options,
            visited: HashSet::new(),
            hidden_tables: 0,
        }
    }

    /// Extract every visible top-level table of `document`, in document order.
    pub fn extract_tables(&mut self, document: &Html) -> Vec<TableNode> {
        let mut tables = Vec::new();

        for element in document.select(&TABLE_SELECTOR) {
            if self.visited.contains(&element.id()) {
                continue;
            }
            if is_hidden(&element) {
                self.hidden_tables += 1;
                self.mark_visited(&element);
                continue;
            }
            tables.push(self.extract_table(element, 0));
        }

        debug!(
            tables = tables.len(),
            hidden = self.hidden_tables,
            "extracted tables"
        );
        tables
    }

    /// Number of tables skipped because they were hidden.
    pub fn hidden_tables(&self) -> usize {
        self.hidden_tables
    }

    /// Mark `element` and every table below it as processed.
    fn mark_visited(&mut self, element: &ElementRef<'_>) {
        self.visited.insert(element.id());
        for table in element.select(&TABLE_SELECTOR) {
            self.visited.insert(table.id());
        }
    }

    fn extract_table(&mut self, table: ElementRef<'_>, depth: usize) -> TableNode {
        self.visited.insert(table.id());

        // One level past the limit is still recorded so the resolver can
        // account for what it drops; nothing below it is read.
        if depth > self.options.max_nested_depth {
            self.mark_visited(&table);
            return TableNode {
                id: table.id(),
                depth,
                rows: Vec::new(),
                truncated: true,
            };
        }

        let mut rows = Vec::new();
        for child in table.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "tr" => rows.push(self.extract_row(child, depth)),
                "thead" | "tbody" | "tfoot" => {
                    for tr in child.children().filter_map(ElementRef::wrap) {
                        if tr.value().name() == "tr" {
                            rows.push(self.extract_row(tr, depth));
                        }
                    }
                },
                _ => {},
            }
        }

        TableNode {
            id: table.id(),
            depth,
            rows,
            truncated: false,
        }
    }

    fn extract_row(&mut self, tr: ElementRef<'_>, depth: usize) -> RowNode {
        if is_hidden(&tr) {
            self.mark_visited(&tr);
            return RowNode {
                attributes: style_attributes(&tr),
                hidden: true,
                cells: SmallVec::new(),
            };
        }

        let mut cells = SmallVec::new();
        for cell in tr.children().filter_map(ElementRef::wrap) {
            let kind = match cell.value().name() {
                "td" => CellKind::Data,
                "th" => CellKind::Header,
                _ => continue,
            };
            cells.push(self.extract_cell(cell, kind, depth));
        }

        RowNode {
            attributes: style_attributes(&tr),
            hidden: false,
            cells,
        }
    }

    fn extract_cell(&mut self, cell: ElementRef<'_>, kind: CellKind, depth: usize) -> CellNode {
        let mut collector = BlockCollector::new(self.options.preserve_line_breaks);
        self.collect_blocks(*cell, depth, &mut collector);

        CellNode {
            kind,
            rowspan: parse_span(cell.value().attr("rowspan"), MAX_ROWSPAN),
            colspan: parse_span(cell.value().attr("colspan"), MAX_COLSPAN),
            attributes: style_attributes(&cell),
            blocks: collector.finish(),
        }
    }

    fn collect_blocks(
        &mut self,
        node: NodeRef<'_, Node>,
        depth: usize,
        collector: &mut BlockCollector,
    ) {
        for child in node.children() {
            match child.value() {
                Node::Text(text) => collector.push_text(text),
                Node::Element(element) => match element.name() {
                    "table" => {
                        let Some(table) = ElementRef::wrap(child) else {
                            continue;
                        };
                        if self.visited.contains(&table.id()) {
                            continue;
                        }
                        if is_hidden(&table) {
                            self.hidden_tables += 1;
                            self.mark_visited(&table);
                            continue;
                        }
                        let nested = self.extract_table(table, depth + 1);
                        collector.push_table(nested);
                    },
                    "br" => collector.line_break(),
                    "script" | "style" | "template" | "noscript" => {},
                    name if is_block_element(name) => {
                        collector.line_break();
                        self.collect_blocks(child, depth, collector);
                        collector.line_break();
                    },
                    _ => self.collect_blocks(child, depth, collector),
                },
                _ => {},
            }
        }
    }
}

/// Accumulates cell content into text runs separated by nested tables.
struct BlockCollector {
    preserve_line_breaks: bool,
    blocks: Vec<CellBlock>,
    lines: Vec<String>,
    current: String,
}

impl BlockCollector {
    fn new(preserve_line_breaks: bool) -> Self {
        Self {
            preserve_line_breaks,
            blocks: Vec::new(),
            lines: Vec::new(),
            current: String::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn line_break(&mut self) {
        if self.preserve_line_breaks {
            self.lines.push(std::mem::take(&mut self.current));
        } else {
            self.current.push(' ');
        }
    }

    fn push_table(&mut self, table: TableNode) {
        self.flush_text();
        self.blocks.push(CellBlock::Table(table));
    }

    /// Collapse whitespace per line and drop blank lines.
    fn flush_text(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));

        let mut text = String::new();
        for line in self.lines.drain(..) {
            let mut words = line.split_whitespace().peekable();
            if words.peek().is_none() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            for (i, word) in words.enumerate() {
                if i > 0 {
                    text.push(' ');
                }
                text.push_str(word);
            }
        }

        if !text.is_empty() {
            self.blocks.push(CellBlock::Text(text));
        }
    }

    fn finish(mut self) -> Vec<CellBlock> {
        self.flush_text();
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<TableNode> {
        let options = ConvertOptions::default();
        let document = Html::parse_document(html);
        TableExtractor::new(&options).extract_tables(&document)
    }

    #[test]
    fn test_parse_span() {
        assert_eq!(parse_span(None, 10), 1);
        assert_eq!(parse_span(Some("3"), 10), 3);
        assert_eq!(parse_span(Some(" 2px"), 10), 2);
        assert_eq!(parse_span(Some("0"), 10), 1);
        assert_eq!(parse_span(Some("abc"), 10), 1);
        assert_eq!(parse_span(Some("99"), 10), 10);
        assert_eq!(parse_span(Some("123456789012"), 10), 10);
    }

    #[test]
    fn test_rows_from_sections() {
        let tables = extract(
            "<table><thead><tr><th>H</th></tr></thead>\
             <tbody><tr><td>1</td></tr><tr style='display: none'><td>x</td></tr></tbody></table>",
        );
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].cells[0].kind, CellKind::Header);
        assert!(table.rows[2].hidden);
        assert_eq!(table.visible_rows().count(), 2);
    }

    #[test]
    fn test_text_is_unescaped_and_collapsed() {
        let tables = extract(
            "<table><tr><td>  a &amp;   b <br> <b>c</b>\n d<p>e</p></td></tr></table>",
        );
        let cell = &tables[0].rows[0].cells[0];
        assert_eq!(cell.text(), "a & b\nc d\ne");
    }

    #[test]
    fn test_line_breaks_flattened_on_request() {
        let options = ConvertOptions::default().with_line_breaks(false);
        let document = Html::parse_document("<table><tr><td>a<br>b</td></tr></table>");
        let tables = TableExtractor::new(&options).extract_tables(&document);
        assert_eq!(tables[0].rows[0].cells[0].text(), "a b");
    }

    #[test]
    fn test_nested_tables_are_not_top_level() {
        let tables = extract(
            "<table><tr><td>before<table><tr><td>inner</td></tr></table>after</td></tr></table>\
             <table><tr><td>second</td></tr></table>",
        );
        assert_eq!(tables.len(), 2);
        let cell = &tables[0].rows[0].cells[0];
        assert_eq!(cell.blocks.len(), 3);
        assert!(matches!(&cell.blocks[0], CellBlock::Text(t) if t == "before"));
        assert!(matches!(&cell.blocks[1], CellBlock::Table(t) if t.depth == 1));
        assert!(matches!(&cell.blocks[2], CellBlock::Text(t) if t == "after"));
        assert_eq!(tables[0].table_count(), 2);
    }

    #[test]
    fn test_hidden_tables_are_skipped() {
        let options = ConvertOptions::default();
        let document = Html::parse_document(
            "<table style='display:none'><tr><td><table><tr><td>x</td></tr></table></td></tr></table>\
             <table><tr><td>shown</td></tr></table>",
        );
        let mut extractor = TableExtractor::new(&options);
        let tables = extractor.extract_tables(&document);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0].cells[0].text(), "shown");
        assert_eq!(extractor.hidden_tables(), 1);
    }

    #[test]
    fn test_depth_limit_truncates() {
        let options = ConvertOptions::default().with_max_nested_depth(0);
        let document = Html::parse_document(
            "<table><tr><td><table><tr><td><table><tr><td>deep</td></tr></table></td></tr></table></td></tr></table>",
        );
        let tables = TableExtractor::new(&options).extract_tables(&document);
        assert_eq!(tables.len(), 1);
        let nested: Vec<_> = tables[0].rows[0].cells[0].nested_tables().collect();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].truncated);
        assert!(nested[0].rows.is_empty());
    }
}
