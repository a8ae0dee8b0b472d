//! XLSX output sink.

use std::io::{Cursor, Seek, Write};

use tracing::debug;

use super::format::{
    CellAlignment, CellBorder, CellBorderLineStyle, CellBorderSide, CellFill, CellFillPatternType,
    CellFont, CellFormat, CellHorizontalAlignment, CellVerticalAlignment,
};
use super::writer::workbook::{SHARED_STRINGS_PATH, STYLES_PATH, WORKSHEET_PATH};
use super::writer::{MutableSharedStrings, PackageWriter, StreamingWorksheet, StylesBuilder};
use crate::common::{Error, RGBColor, Result};
use crate::config::ConvertOptions;
use crate::emit::{FormatHandle, MergeRange, SHEET_MAX_COLS, SHEET_MAX_ROWS, SheetSink};
use crate::style::{BorderKind, CellStyle, HorizontalAlign, VerticalAlign};

fn argb(color: &str) -> Option<String> {
    RGBColor::from_hex(color).map(|color| color.to_argb_hex())
}

fn border_side(kind: BorderKind) -> Option<CellBorderSide> {
    let style = match kind {
        BorderKind::None => return None,
        BorderKind::Solid => CellBorderLineStyle::Thin,
        BorderKind::Double => CellBorderLineStyle::Double,
        BorderKind::Dashed => CellBorderLineStyle::Dashed,
    };
    Some(CellBorderSide {
        style,
        color: Some("FF000000".to_string()),
    })
}

impl From<&CellStyle> for CellFormat {
    fn from(style: &CellStyle) -> Self {
        let font = CellFont {
            name: Some(style.font_name.clone()),
            size: Some(style.font_size_pt()),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            color: style.font_color.as_deref().and_then(argb),
        };

        let fill = style.bg_color.as_deref().and_then(argb).map(|color| CellFill {
            pattern_type: CellFillPatternType::Solid,
            fg_color: Some(color),
            bg_color: None,
        });

        let border = (!style.borders.is_empty()).then(|| CellBorder {
            left: border_side(style.borders.left),
            right: border_side(style.borders.right),
            top: border_side(style.borders.top),
            bottom: border_side(style.borders.bottom),
        });

        let horizontal = match style.align {
            HorizontalAlign::General => None,
            HorizontalAlign::Left => Some(CellHorizontalAlignment::Left),
            HorizontalAlign::Center => Some(CellHorizontalAlignment::Center),
            HorizontalAlign::Right => Some(CellHorizontalAlignment::Right),
            HorizontalAlign::Justify => Some(CellHorizontalAlignment::Justify),
        };
        let vertical = match style.valign {
            VerticalAlign::Top => CellVerticalAlignment::Top,
            VerticalAlign::Center => CellVerticalAlignment::Center,
            VerticalAlign::Bottom => CellVerticalAlignment::Bottom,
        };

        CellFormat {
            font: Some(font),
            fill,
            border,
            alignment: Some(CellAlignment {
                horizontal,
                vertical: Some(vertical),
                wrap_text: style.wrap,
            }),
        }
    }
}

/// Sink writing a single-sheet XLSX workbook to `W`.
///
/// Rows are streamed into the worksheet part as the emitter flushes them;
/// the shared strings and styles parts are written when the sink is closed.
/// Identical styles map to the same style record, so a format handle
/// requested twice comes back unchanged. Positions past `XFD1048576` are
/// refused with [`Error::OutOfRange`].
///
/// # Examples
///
/// ```rust
/// use htmlgrid::{ConvertOptions, SheetSink, XlsxSink};
/// use htmlgrid::emit::FormatHandle;
///
/// let options = ConvertOptions::default();
/// let mut sink = XlsxSink::in_memory(&options);
/// sink.new_sheet("Report").unwrap();
/// sink.write_cell(0, 0, "hello", FormatHandle(0)).unwrap();
/// let bytes = sink.into_bytes().unwrap();
/// assert_eq!(&bytes[..2], b"PK");
/// ```
pub struct XlsxSink<W: Write + Seek> {
    package: Option<PackageWriter<W>>,
    output: Option<W>,
    worksheet: Option<StreamingWorksheet>,
    default_sheet_name: String,
    strings: MutableSharedStrings,
    styles: StylesBuilder,
}

impl XlsxSink<Cursor<Vec<u8>>> {
    /// Sink writing into an in-memory buffer.
    pub fn in_memory(options: &ConvertOptions) -> Self {
        Self::new(Cursor::new(Vec::new()), options)
    }

    /// Close the sink and return the workbook bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        Ok(self.into_inner()?.into_inner())
    }
}

impl<W: Write + Seek> XlsxSink<W> {
    pub fn new(writer: W, options: &ConvertOptions) -> Self {
        let default_font = CellFont {
            name: Some(options.default_font_name.clone()),
            size: Some(CellStyle::plain(options).font_size_pt()),
            ..Default::default()
        };
        Self {
            package: Some(PackageWriter::new(writer)),
            output: None,
            worksheet: None,
            default_sheet_name: options.sheet_name.clone(),
            strings: MutableSharedStrings::new(),
            styles: StylesBuilder::new(default_font),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.package.is_none() {
            return Err(Error::Sink("workbook already closed".to_string()));
        }
        if self.worksheet.is_none() {
            return Err(Error::Sink("no worksheet started".to_string()));
        }
        Ok(())
    }

    fn worksheet(&mut self) -> Result<&mut StreamingWorksheet> {
        self.ensure_open()?;
        self.worksheet
            .as_mut()
            .ok_or_else(|| Error::Sink("no worksheet started".to_string()))
    }

    fn style_index(&self, format: FormatHandle) -> Result<usize> {
        let index = format.0 as usize;
        if index >= self.styles.len() {
            return Err(Error::Sink(format!("unknown format handle {}", format.0)));
        }
        Ok(index)
    }

    fn check_bounds(row: u32, col: u32) -> Result<()> {
        if row >= SHEET_MAX_ROWS || col >= SHEET_MAX_COLS {
            return Err(Error::OutOfRange { row, col });
        }
        Ok(())
    }

    fn place(&mut self, row: u32, col: u32, text: &str, format: FormatHandle) -> Result<()> {
        let style = self.style_index(format)?;
        self.ensure_open()?;
        Self::check_bounds(row, col)?;
        let string = (!text.is_empty()).then(|| self.strings.add_string(text));
        self.worksheet()?.write_cell(row, col, string, style)
    }

    /// Close the sink if needed and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        self.output
            .take()
            .ok_or_else(|| Error::Sink("workbook output unavailable".to_string()))
    }
}

impl<W: Write + Seek> SheetSink for XlsxSink<W> {
    fn new_sheet(&mut self, name: &str) -> Result<()> {
        if self.package.is_none() {
            return Err(Error::Sink("workbook already closed".to_string()));
        }
        if let Some(ref sheet) = self.worksheet {
            return Err(Error::Sink(format!(
                "workbook already holds sheet {:?}",
                sheet.name()
            )));
        }
        self.worksheet = Some(StreamingWorksheet::new(name));
        Ok(())
    }

    fn create_format(&mut self, style: &CellStyle) -> Result<FormatHandle> {
        let index = self.styles.add_cell_format(&CellFormat::from(style));
        u32::try_from(index)
            .map(FormatHandle)
            .map_err(|_| Error::Sink("too many cell formats".to_string()))
    }

    fn write_cell(&mut self, row: u32, col: u32, text: &str, format: FormatHandle) -> Result<()> {
        self.place(row, col, text, format)
    }

    fn merge_cells(&mut self, range: MergeRange, text: &str, format: FormatHandle) -> Result<()> {
        let style = self.style_index(format)?;
        Self::check_bounds(range.last_row, range.last_col)?;
        if self.worksheet()?.merge_conflicts(&range) {
            return Err(Error::MergeConflict(range));
        }
        self.place(range.first_row, range.first_col, text, format)?;
        let worksheet = self.worksheet()?;
        worksheet.fill_blanks(&range, style)?;
        worksheet.merge(range)
    }

    fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        self.worksheet()?.set_column_width(col, width)
    }

    fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        self.worksheet()?.set_row_height(row, height)
    }

    fn flush(&mut self) -> Result<()> {
        self.worksheet()?.flush()
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut package) = self.package.take() else {
            return Ok(());
        };
        let mut worksheet = self
            .worksheet
            .take()
            .unwrap_or_else(|| StreamingWorksheet::new(self.default_sheet_name.clone()));

        package.add_workbook_parts(worksheet.name())?;
        package.add_part(STYLES_PATH, self.styles.to_xml()?.as_bytes())?;
        package.add_part(SHARED_STRINGS_PATH, self.strings.to_xml()?.as_bytes())?;
        worksheet.finish(package.start_part(WORKSHEET_PATH)?)?;

        debug!(
            sheet = worksheet.name(),
            rows = worksheet.row_count(),
            strings = self.strings.count(),
            formats = self.styles.len(),
            "workbook closed"
        );
        self.output = Some(package.finish()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(bytes: &[u8], path: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_workbook_round_trip() {
        let options = ConvertOptions::default();
        let mut sink = XlsxSink::in_memory(&options);
        sink.new_sheet("Report").unwrap();

        let header = CellStyle {
            bold: true,
            bg_color: Some("#D9D9D9".to_string()),
            ..CellStyle::plain(&options)
        };
        let header_format = sink.create_format(&header).unwrap();
        let plain_format = sink.create_format(&CellStyle::plain(&options)).unwrap();
        assert_eq!(sink.create_format(&header).unwrap(), header_format);

        sink.merge_cells(MergeRange::new(0, 0, 0, 1), "Title", header_format)
            .unwrap();
        sink.write_cell(1, 0, "a & b", plain_format).unwrap();
        sink.write_cell(1, 1, "", plain_format).unwrap();
        sink.flush().unwrap();
        sink.set_column_width(0, 20.0).unwrap();
        let bytes = sink.into_bytes().unwrap();

        let sheet = read_part(&bytes, WORKSHEET_PATH);
        assert!(sheet.contains(r#"<mergeCell ref="A1:B1"/>"#));
        assert!(sheet.contains(&format!(r#"<c r="B1" s="{}"/>"#, header_format.0)));
        assert!(sheet.contains(r#"<col min="1" max="1" width="20.0" customWidth="1"/>"#));
        assert!(sheet.contains(r#"<c r="B2" s="2"/>"#));

        let strings = read_part(&bytes, SHARED_STRINGS_PATH);
        assert!(strings.contains("<t>a &amp; b</t>"));

        let styles = read_part(&bytes, STYLES_PATH);
        assert!(styles.contains(r#"<fgColor rgb="FFD9D9D9"/>"#));
        assert!(styles.contains("<b/>"));

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Report""#));
    }

    #[test]
    fn test_merge_conflict_leaves_sheet_untouched() {
        let options = ConvertOptions::default();
        let mut sink = XlsxSink::in_memory(&options);
        sink.new_sheet("Sheet1").unwrap();
        sink.merge_cells(MergeRange::new(0, 0, 1, 1), "a", FormatHandle(0))
            .unwrap();
        let err = sink
            .merge_cells(MergeRange::new(1, 1, 2, 2), "b", FormatHandle(0))
            .unwrap_err();
        assert!(matches!(err, Error::MergeConflict(_)));

        let sheet = read_part(&sink.into_bytes().unwrap(), WORKSHEET_PATH);
        assert!(sheet.contains(r#"<c r="B2"/>"#));
        assert!(!sheet.contains(r#"r="C3""#));
        assert!(sheet.contains(r#"<mergeCells count="1">"#));
    }

    #[test]
    fn test_misuse_is_a_sink_error() {
        let options = ConvertOptions::default();
        let mut sink = XlsxSink::in_memory(&options);
        assert!(matches!(
            sink.write_cell(0, 0, "x", FormatHandle(0)),
            Err(Error::Sink(_))
        ));
        sink.new_sheet("Sheet1").unwrap();
        assert!(sink.new_sheet("Other").is_err());
        assert!(sink.write_cell(0, 0, "x", FormatHandle(42)).is_err());

        sink.close().unwrap();
        sink.close().unwrap();
        assert!(sink.write_cell(0, 0, "x", FormatHandle(0)).unwrap_err().is_sink_failure());
    }

    #[test]
    fn test_style_mapping() {
        let options = ConvertOptions::default();
        let mut style = CellStyle::plain(&options);
        style.borders.left = BorderKind::Double;
        style.align = HorizontalAlign::Right;
        style.font_color = Some("#FF0000".to_string());

        let format = CellFormat::from(&style);
        let font = format.font.unwrap();
        assert_eq!(font.color.as_deref(), Some("FFFF0000"));
        assert_eq!(font.size, Some(11.0));
        let border = format.border.unwrap();
        assert!(matches!(
            border.left.map(|side| side.style),
            Some(CellBorderLineStyle::Double)
        ));
        assert!(border.top.is_none());
        assert!(format.fill.is_none());
        let alignment = format.alignment.unwrap();
        assert!(matches!(alignment.horizontal, Some(CellHorizontalAlignment::Right)));
        assert!(alignment.wrap_text);

        let plain = CellFormat::from(&CellStyle::plain(&options));
        assert!(plain.border.is_none());
        assert!(plain.alignment.unwrap().horizontal.is_none());
    }

    #[test]
    fn test_merged_range_carries_format_on_every_position() {
        let options = ConvertOptions::default();
        let mut sink = XlsxSink::in_memory(&options);
        sink.new_sheet("Sheet1").unwrap();
        let boxed = CellStyle {
            borders: crate::style::Borders {
                left: BorderKind::Solid,
                right: BorderKind::Solid,
                top: BorderKind::Solid,
                bottom: BorderKind::Solid,
            },
            ..CellStyle::plain(&options)
        };
        let format = sink.create_format(&boxed).unwrap();
        sink.merge_cells(MergeRange::new(0, 0, 1, 1), "box", format)
            .unwrap();
        sink.flush().unwrap();
        sink.write_cell(1, 2, "next", FormatHandle(0)).unwrap();

        let sheet = read_part(&sink.into_bytes().unwrap(), WORKSHEET_PATH);
        let s = format.0;
        assert!(sheet.contains(&format!(r#"<c r="A1" s="{s}" t="s"><v>0</v></c><c r="B1" s="{s}"/>"#)));
        assert!(sheet.contains(&format!(r#"<c r="A2" s="{s}"/><c r="B2" s="{s}"/><c r="C2" t="s">"#)));
    }

    #[test]
    fn test_positions_past_xfd_are_refused() {
        let options = ConvertOptions::default();
        let mut sink = XlsxSink::in_memory(&options);
        sink.new_sheet("Sheet1").unwrap();

        let wide = MergeRange::new(0, 15_984, 0, 16_983);
        assert!(matches!(
            sink.merge_cells(wide, "late", FormatHandle(0)),
            Err(Error::OutOfRange { .. })
        ));
        let err = sink
            .write_cell(0, SHEET_MAX_COLS, "late", FormatHandle(0))
            .unwrap_err();
        assert!(!err.is_sink_failure());
        sink.write_cell(0, 0, "kept", FormatHandle(0)).unwrap();

        let bytes = sink.into_bytes().unwrap();
        let sheet = read_part(&bytes, WORKSHEET_PATH);
        assert!(!sheet.contains("<mergeCell "));
        let strings = read_part(&bytes, SHARED_STRINGS_PATH);
        assert!(!strings.contains("late"));
    }
}
