//! HTML to spreadsheet conversion.
//!
//! The converter drives the whole pipeline: it splits the input into
//! documents, extracts each document's top-level tables, resolves them into
//! grids (on a bounded worker pool for large inputs) and emits the grids in
//! document order, one below the other, into a single worksheet.

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use scraper::Html;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::common::{Error, Result};
use crate::config::ConvertOptions;
use crate::emit::{GridEmitter, SheetSink};
use crate::html::{TableExtractor, TableNode, split_documents};
use crate::ooxml::XlsxSink;
use crate::report::ConversionReport;
use crate::style::StyleCache;
use crate::table::{Grid, NestedTableResolver};

/// An in-memory XLSX workbook and how it was produced.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub bytes: Vec<u8>,
    pub report: ConversionReport,
}

/// Converts HTML tables into a single worksheet.
///
/// Every call is independent: caches live for one conversion only, so a
/// converter can be shared and reused freely.
///
/// # Examples
///
/// ```rust
/// use htmlgrid::{ConvertOptions, Converter, MemorySink};
///
/// let converter = Converter::new(ConvertOptions::default()).unwrap();
///
/// let mut sink = MemorySink::new();
/// let report = converter
///     .convert_with_sink("<table><tr><th colspan=2>Total</th></tr></table>", &mut sink)
///     .unwrap();
/// assert_eq!(report.merges, 1);
/// assert_eq!(sink.text(0, 0), Some("Total"));
///
/// let conversion = converter.convert("<table><tr><td>x</td></tr></table>").unwrap();
/// assert_eq!(&conversion.bytes[..2], b"PK");
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
}

/// Where the next table goes and what preceded it.
struct Placement {
    next_row: u32,
    wrote_table: bool,
}

impl Converter {
    /// Create a converter after validating `options`.
    pub fn new(options: ConvertOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `html` into XLSX bytes.
    pub fn convert(&self, html: &str) -> Result<Conversion> {
        let mut sink = XlsxSink::in_memory(&self.options);
        let report = self.convert_with_sink(html, &mut sink)?;
        let bytes = sink.into_bytes()?;
        Ok(Conversion { bytes, report })
    }

    /// Convert `html` into an XLSX file at `path`.
    ///
    /// The workbook is written to a temporary file in the target directory
    /// and moved into place only once it is complete, so a failed conversion
    /// never leaves a partial file behind.
    pub fn convert_to_file(&self, html: &str, path: impl AsRef<Path>) -> Result<ConversionReport> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let temp = NamedTempFile::new_in(dir)?;
        let mut sink = XlsxSink::new(BufWriter::new(temp), &self.options);
        let report = self.convert_with_sink(html, &mut sink)?;

        let temp = sink
            .into_inner()?
            .into_inner()
            .map_err(|err| Error::Io(err.into_error()))?;
        temp.as_file().sync_all()?;
        temp.persist(path)?;

        info!(path = %path.display(), "workbook written");
        Ok(report)
    }

    /// Convert `html` into any sink, closing it at the end.
    pub fn convert_with_sink<S: SheetSink + ?Sized>(
        &self,
        html: &str,
        sink: &mut S,
    ) -> Result<ConversionReport> {
        let started = Instant::now();
        let options = &self.options;
        let cache = StyleCache::new(options);
        let mut emitter = GridEmitter::new(options);
        let mut report = ConversionReport::default();
        let mut placement = Placement {
            next_row: 0,
            wrote_table: false,
        };

        let pool = self.worker_pool(html.len())?;
        let window = match pool {
            Some(_) => options.worker_threads,
            None => 1,
        };

        sink.new_sheet(&options.sheet_name)?;

        let documents = split_documents(html);
        report.documents = documents.len();

        for (document_index, document) in documents.into_iter().enumerate() {
            let phase = Instant::now();
            let tables = self.extract_tables(document, &mut report);
            debug!(
                document = document_index,
                tables = tables.len(),
                elapsed_ms = phase.elapsed().as_millis() as u64,
                "document parsed"
            );

            let mut first_in_document = true;
            for batch in tables.chunks(window) {
                let phase = Instant::now();
                let grids = self.resolve_grids(batch, &cache, pool.as_ref());
                debug!(
                    document = document_index,
                    grids = grids.len(),
                    elapsed_ms = phase.elapsed().as_millis() as u64,
                    "grids resolved"
                );

                for grid in grids {
                    if grid.is_empty() {
                        continue;
                    }
                    let spacing = if first_in_document {
                        options.document_spacing
                    } else {
                        options.table_spacing
                    };
                    self.emit_grid(&grid, spacing, &mut placement, &mut emitter, sink, &cache, &mut report)?;
                    first_in_document = false;
                }
            }
        }

        if options.require_tables && report.tables == 0 {
            return Err(Error::NoTablesFound);
        }

        emitter.finish(sink)?;
        sink.close()?;

        report.cache = cache.stats();
        report.elapsed = started.elapsed();
        info!(
            documents = report.documents,
            tables = report.tables,
            rows = report.rows,
            cells = report.cells,
            merges = report.merges,
            degradations = report.degradations.total(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "conversion finished"
        );
        Ok(report)
    }

    /// A bounded pool when the input is large enough to pay for one.
    fn worker_pool(&self, input_len: usize) -> Result<Option<ThreadPool>> {
        let options = &self.options;
        if options.worker_threads <= 1 || input_len < options.parallel_threshold_bytes {
            return Ok(None);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.worker_threads)
            .thread_name(|index| format!("htmlgrid-worker-{index}"))
            .build()?;
        debug!(threads = options.worker_threads, "building grids in parallel");
        Ok(Some(pool))
    }

    /// Parse one document and copy out its visible top-level tables.
    fn extract_tables(&self, document: &str, report: &mut ConversionReport) -> Vec<TableNode> {
        let parsed = Html::parse_document(document);
        let mut extractor = TableExtractor::new(&self.options);
        let tables = extractor.extract_tables(&parsed);
        report.hidden_tables += extractor.hidden_tables();
        tables
    }

    /// Resolve `tables` into grids, in order.
    fn resolve_grids(
        &self,
        tables: &[TableNode],
        cache: &StyleCache,
        pool: Option<&ThreadPool>,
    ) -> Vec<Grid> {
        let resolve = |table: &TableNode| NestedTableResolver::new(&self.options, cache).resolve(table);
        match pool {
            Some(pool) if tables.len() > 1 => pool.install(|| tables.par_iter().map(resolve).collect()),
            _ => tables.iter().map(resolve).collect(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_grid<S: SheetSink + ?Sized>(
        &self,
        grid: &Grid,
        spacing: u32,
        placement: &mut Placement,
        emitter: &mut GridEmitter<'_>,
        sink: &mut S,
        cache: &StyleCache,
        report: &mut ConversionReport,
    ) -> Result<()> {
        if placement.wrote_table {
            placement.next_row = advance(placement.next_row, spacing)?;
        }
        let origin_row = placement.next_row;

        let summary = emitter.emit(grid, origin_row, 0, sink, cache)?;
        debug!(
            table = report.tables,
            origin_row,
            rows = grid.rows(),
            cols = grid.cols(),
            "table emitted"
        );

        let height = u32::try_from(grid.rows())
            .map_err(|_| Error::Sink(format!("table of {} rows", grid.rows())))?;
        placement.next_row = advance(origin_row, height)?;
        placement.wrote_table = true;

        report.tables += 1;
        report.rows += summary.rows;
        report.cells += summary.cells;
        report.merges += summary.merges;
        report.degradations.merge(grid.degradations());
        report.degradations.merges_rejected += summary.merges_rejected;
        report.degradations.out_of_range += summary.out_of_range;
        Ok(())
    }
}

fn advance(row: u32, by: u32) -> Result<u32> {
    row.checked_add(by)
        .ok_or_else(|| Error::Sink("sheet row limit exceeded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{MemorySink, MergeRange};
    use std::io::Read;

    fn convert(html: &str, options: ConvertOptions) -> (MemorySink, ConversionReport) {
        let mut sink = MemorySink::new();
        let report = Converter::new(options)
            .unwrap()
            .convert_with_sink(html, &mut sink)
            .unwrap();
        (sink, report)
    }

    fn nest(levels: usize) -> String {
        let mut html = format!("<table><tr><td>L{levels}</td></tr></table>");
        for level in (0..levels).rev() {
            html = format!("<table><tr><td>L{level}</td><td>{html}</td></tr></table>");
        }
        html
    }

    #[test]
    fn test_simple_table_with_header() {
        let (sink, report) = convert(
            "<table><tr><th>Name</th><th>Qty</th></tr><tr><td>apple</td><td>3</td></tr></table>",
            ConvertOptions::default(),
        );

        assert_eq!(sink.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(sink.text(0, 0), Some("Name"));
        assert_eq!(sink.text(1, 1), Some("3"));
        assert!(sink.style(0, 1).unwrap().bold);
        assert!(!sink.style(1, 0).unwrap().bold);
        assert!(sink.merges.is_empty());
        assert!(sink.closed);
        assert!(!sink.column_widths.is_empty());

        assert_eq!(report.documents, 1);
        assert_eq!(report.tables, 1);
        assert_eq!(report.rows, 2);
        assert_eq!(report.cells, 4);
        assert_eq!(report.merges, 0);
        assert_eq!(report.degradations.total(), 0);
    }

    #[test]
    fn test_colspan_becomes_merge() {
        let (sink, report) = convert(
            "<table><tr><td>a</td><td>b</td></tr><tr><td colspan=2>wide</td></tr></table>",
            ConvertOptions::default(),
        );
        assert_eq!(sink.merges.ranges(), &[MergeRange::new(1, 0, 1, 1)]);
        assert_eq!(sink.text(1, 0), Some("wide"));
        assert_eq!(report.merges, 1);
    }

    #[test]
    fn test_nesting_past_depth_limit_drops_deepest_level() {
        let (sink, report) = convert(&nest(4), ConvertOptions::default());
        let texts: Vec<&str> = sink.cells.values().map(|cell| cell.text.as_str()).collect();

        for level in 0..=3 {
            assert!(texts.contains(&format!("L{level}").as_str()), "missing L{level}");
        }
        assert!(!texts.contains(&"L4"));
        assert_eq!(report.tables, 1);
        assert_eq!(report.degradations.nested_dropped, 1);
    }

    #[test]
    fn test_documents_and_tables_are_spaced() {
        let html = "<html><body><table><tr><td>a</td></tr><tr><td>a2</td></tr></table>\
                    <table><tr><td>b</td></tr></table></body></html>\
                    <html><body><table><tr><td>c</td></tr></table></body></html>";
        let (sink, report) = convert(html, ConvertOptions::default().with_spacing(1, 3));

        assert_eq!(report.documents, 2);
        assert_eq!(report.tables, 3);
        assert_eq!(sink.text(0, 0), Some("a"));
        assert_eq!(sink.text(1, 0), Some("a2"));
        // One blank row between tables of a document
        assert_eq!(sink.text(3, 0), Some("b"));
        // Three blank rows before the next document
        assert_eq!(sink.text(7, 0), Some("c"));
        assert_eq!(sink.last_row(), Some(7));
    }

    #[test]
    fn test_hidden_and_empty_tables_take_no_rows() {
        let html = "<table style='display:none'><tr><td>secret</td></tr></table>\
                    <table></table>\
                    <table><tr><td>shown</td></tr></table>";
        let (sink, report) = convert(html, ConvertOptions::default());
        assert_eq!(sink.text(0, 0), Some("shown"));
        assert_eq!(sink.cells.len(), 1);
        assert_eq!(report.hidden_tables, 1);
        assert_eq!(report.tables, 1);
    }

    #[test]
    fn test_conversion_is_repeatable_with_tiny_caches() {
        let mut rows = String::new();
        for i in 0..40 {
            rows.push_str(&format!(
                "<tr><td style='color:#{:02x}0000;font-weight:{}'>r{i}</td><td colspan={}>x</td></tr>",
                i * 6,
                if i % 2 == 0 { "bold" } else { "normal" },
                1 + i % 3
            ));
        }
        let html = format!("<table>{rows}</table><table><tr><td>{}</td></tr></table>", nest(2));
        let options = ConvertOptions::default().with_cache_capacity(2);

        let (first, first_report) = convert(&html, options.clone());
        let (second, second_report) = convert(&html, options);

        assert_eq!(first.cells, second.cells);
        assert_eq!(first.merges.ranges(), second.merges.ranges());
        assert_eq!(first.column_widths, second.column_widths);
        assert_eq!(first.formats, second.formats);
        assert_eq!(first_report.degradations, second_report.degradations);
        assert!(first_report.cache.formats.evictions > 0);
    }

    #[test]
    fn test_parallel_and_sequential_output_match() {
        let html: String = (0..7)
            .map(|t| format!("<table><tr><td rowspan=2>t{t}</td><td>a</td></tr><tr><td>b</td></tr></table>"))
            .collect();

        let (sequential, _) = convert(&html, ConvertOptions::default().with_parallelism(1, 0));
        let (parallel, report) = convert(&html, ConvertOptions::default().with_parallelism(3, 0));

        assert_eq!(report.tables, 7);
        assert_eq!(sequential.cells, parallel.cells);
        assert_eq!(sequential.merges.ranges(), parallel.merges.ranges());
        assert_eq!(parallel.text(4 * 6, 0), Some("t6"));
    }

    #[test]
    fn test_require_tables() {
        let converter = Converter::new(ConvertOptions::default().with_require_tables(true)).unwrap();
        let mut sink = MemorySink::new();
        let err = converter
            .convert_with_sink("<p>nothing here</p>", &mut sink)
            .unwrap_err();
        assert!(matches!(err, Error::NoTablesFound));
        assert!(!sink.closed);

        let (sink, report) = convert("<p>nothing here</p>", ConvertOptions::default());
        assert_eq!(report.tables, 0);
        assert!(sink.cells.is_empty());
        assert!(sink.closed);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let err = Converter::new(ConvertOptions::default().with_chunk_size(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_convert_produces_workbook() {
        let converter = Converter::new(ConvertOptions::default().with_sheet_name("Report")).unwrap();
        let conversion = converter
            .convert("<table><tr><th colspan=2>Q&amp;A</th></tr><tr><td>1</td><td>2</td></tr></table>")
            .unwrap();
        assert_eq!(conversion.report.merges, 1);

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(conversion.bytes)).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains(r#"<mergeCell ref="A1:B1"/>"#));
        assert!(sheet.contains("<cols>"));

        let mut strings = String::new();
        archive
            .by_name("xl/sharedStrings.xml")
            .unwrap()
            .read_to_string(&mut strings)
            .unwrap();
        assert!(strings.contains("Q&amp;A"));
    }

    #[test]
    fn test_wide_table_stays_within_sheet_columns() {
        let row: String = (0..17).map(|i| format!("<td colspan=1000>{i}</td>")).collect();
        let converter = Converter::new(ConvertOptions::default()).unwrap();
        let conversion = converter
            .convert(&format!("<table><tr>{row}</tr></table>"))
            .unwrap();
        assert_eq!(conversion.report.merges, 17);
        assert_eq!(conversion.report.degradations.out_of_range, 0);

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(conversion.bytes)).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains(r#"<mergeCell ref="WQK1:XFD1"/>"#));
        assert!(sheet.contains(r#"<dimension ref="A1:XFD1"/>"#));
    }

    #[test]
    fn test_file_output_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.xlsx");
        let converter = Converter::new(ConvertOptions::default().with_require_tables(true)).unwrap();

        let report = converter
            .convert_to_file("<table><tr><td>x</td></tr></table>", &path)
            .unwrap();
        assert_eq!(report.tables, 1);
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let failed = dir.path().join("out").join("empty.xlsx");
        assert!(converter.convert_to_file("<p>none</p>", &failed).is_err());
        assert!(!failed.exists());
        let leftovers = fs::read_dir(dir.path().join("out")).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
