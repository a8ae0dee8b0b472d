//! Styles.xml generator for XLSX files.
//!
//! This module handles the generation of the styles.xml file, which defines
//! the fonts, fills, borders and cell formats used in the workbook.

use crate::common::Result;
use crate::common::xml::escape_xml;
use crate::ooxml::xlsx::format::{
    CellAlignment, CellBorder, CellBorderSide, CellFill, CellFillPatternType, CellFont, CellFormat,
};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as FmtWrite;
use std::hash::{Hash, Hasher};

/// One `<xf>` record of `cellXfs`.
#[derive(Debug, Clone)]
struct XfRecord {
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    alignment: Option<CellAlignment>,
}

/// Builder for generating styles.xml content.
///
/// This struct collects all unique fonts, fills, borders, and cell formats,
/// assigns indices to them, and generates the complete styles.xml content.
#[derive(Debug)]
pub struct StylesBuilder {
    /// Unique fonts (index -> font)
    fonts: Vec<CellFont>,
    /// Font lookup (font hash -> index)
    font_map: HashMap<u64, usize>,
    /// Unique fills (index -> fill)
    fills: Vec<CellFill>,
    /// Fill lookup (fill hash -> index)
    fill_map: HashMap<u64, usize>,
    /// Unique borders (index -> border)
    borders: Vec<CellBorder>,
    /// Border lookup (border hash -> index)
    border_map: HashMap<u64, usize>,
    /// Cell formats (XF records)
    cell_formats: Vec<XfRecord>,
    /// Cell format lookup (format hash -> index)
    cell_format_map: HashMap<u64, usize>,
}

impl StylesBuilder {
    /// Create a new StylesBuilder whose default font is `font`.
    pub fn new(font: CellFont) -> Self {
        let mut builder = Self {
            fonts: Vec::new(),
            font_map: HashMap::new(),
            fills: Vec::new(),
            fill_map: HashMap::new(),
            borders: Vec::new(),
            border_map: HashMap::new(),
            cell_formats: Vec::new(),
            cell_format_map: HashMap::new(),
        };

        // Font 0 is the workbook default
        builder.add_font(&font);

        // Fills 0 and 1 are reserved: no fill, then gray125
        builder.add_fill(&CellFill {
            pattern_type: CellFillPatternType::None,
            fg_color: None,
            bg_color: None,
        });
        builder.add_fill(&CellFill {
            pattern_type: CellFillPatternType::Gray125,
            fg_color: None,
            bg_color: None,
        });

        builder.add_border(&CellBorder::default());

        // Style index 0
        builder.cell_formats.push(XfRecord {
            font_id: 0,
            fill_id: 0,
            border_id: 0,
            alignment: None,
        });

        builder
    }

    /// Add a cell format and return its style index.
    ///
    /// If the format has already been added, returns the existing index.
    pub fn add_cell_format(&mut self, format: &CellFormat) -> usize {
        let format_hash = Self::hash_cell_format(format);

        if let Some(&index) = self.cell_format_map.get(&format_hash) {
            return index;
        }

        let font_id = format.font.as_ref().map_or(0, |font| self.add_font(font));
        let fill_id = format.fill.as_ref().map_or(0, |fill| self.add_fill(fill));
        let border_id = format
            .border
            .as_ref()
            .map_or(0, |border| self.add_border(border));

        let index = self.cell_formats.len();
        self.cell_formats.push(XfRecord {
            font_id,
            fill_id,
            border_id,
            alignment: format.alignment.clone(),
        });
        self.cell_format_map.insert(format_hash, index);

        index
    }

    /// Number of cell formats, the default one included.
    pub fn len(&self) -> usize {
        self.cell_formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_formats.is_empty()
    }

    /// Add a font and return its index.
    fn add_font(&mut self, font: &CellFont) -> usize {
        let hash = Self::hash_font(font);
        if let Some(&index) = self.font_map.get(&hash) {
            return index;
        }

        let index = self.fonts.len();
        self.fonts.push(font.clone());
        self.font_map.insert(hash, index);
        index
    }

    /// Add a fill and return its index.
    fn add_fill(&mut self, fill: &CellFill) -> usize {
        let hash = Self::hash_fill(fill);
        if let Some(&index) = self.fill_map.get(&hash) {
            return index;
        }

        let index = self.fills.len();
        self.fills.push(fill.clone());
        self.fill_map.insert(hash, index);
        index
    }

    /// Add a border and return its index.
    fn add_border(&mut self, border: &CellBorder) -> usize {
        let hash = Self::hash_border(border);
        if let Some(&index) = self.border_map.get(&hash) {
            return index;
        }

        let index = self.borders.len();
        self.borders.push(border.clone());
        self.border_map.insert(hash, index);
        index
    }

    /// Generate the complete styles.xml content.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        write!(xml, r#"<fonts count="{}">"#, self.fonts.len())?;
        for font in &self.fonts {
            self.write_font(&mut xml, font)?;
        }
        xml.push_str("</fonts>");

        write!(xml, r#"<fills count="{}">"#, self.fills.len())?;
        for fill in &self.fills {
            self.write_fill(&mut xml, fill)?;
        }
        xml.push_str("</fills>");

        write!(xml, r#"<borders count="{}">"#, self.borders.len())?;
        for border in &self.borders {
            self.write_border(&mut xml, border)?;
        }
        xml.push_str("</borders>");

        // Cell style XFs (required, even if empty)
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        write!(xml, r#"<cellXfs count="{}">"#, self.cell_formats.len())?;
        for record in &self.cell_formats {
            self.write_xf(&mut xml, record)?;
        }
        xml.push_str("</cellXfs>");

        // Cell styles (required, even if minimal)
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);

        xml.push_str("</styleSheet>");

        Ok(xml)
    }

    fn write_xf(&self, xml: &mut String, record: &XfRecord) -> Result<()> {
        write!(
            xml,
            r#"<xf numFmtId="0" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
            record.font_id, record.fill_id, record.border_id
        )?;

        // applyXXX attributes only for non-default parts
        if record.font_id != 0 {
            xml.push_str(r#" applyFont="1""#);
        }
        if record.fill_id != 0 {
            xml.push_str(r#" applyFill="1""#);
        }
        if record.border_id != 0 {
            xml.push_str(r#" applyBorder="1""#);
        }

        let Some(ref alignment) = record.alignment else {
            xml.push_str("/>");
            return Ok(());
        };

        xml.push_str(r#" applyAlignment="1"><alignment"#);
        if let Some(horizontal) = alignment.horizontal {
            write!(xml, r#" horizontal="{}""#, horizontal.as_str())?;
        }
        if let Some(vertical) = alignment.vertical {
            write!(xml, r#" vertical="{}""#, vertical.as_str())?;
        }
        if alignment.wrap_text {
            xml.push_str(r#" wrapText="1""#);
        }
        xml.push_str("/></xf>");
        Ok(())
    }

    /// Write a font element to XML.
    fn write_font(&self, xml: &mut String, font: &CellFont) -> Result<()> {
        xml.push_str("<font>");

        if font.bold {
            xml.push_str("<b/>");
        }
        if font.italic {
            xml.push_str("<i/>");
        }
        if font.underline {
            xml.push_str("<u/>");
        }

        if let Some(size) = font.size {
            write!(xml, r#"<sz val="{}"/>"#, ryu::Buffer::new().format(size))?;
        }

        if let Some(ref color) = font.color {
            write!(xml, r#"<color rgb="{}"/>"#, escape_xml(color))?;
        }

        if let Some(ref name) = font.name {
            write!(xml, r#"<name val="{}"/>"#, escape_xml(name))?;
        } else {
            xml.push_str(r#"<name val="Calibri"/>"#);
        }

        xml.push_str("</font>");
        Ok(())
    }

    /// Write a fill element to XML.
    fn write_fill(&self, xml: &mut String, fill: &CellFill) -> Result<()> {
        xml.push_str("<fill>");

        write!(
            xml,
            r#"<patternFill patternType="{}">"#,
            fill.pattern_type.as_str()
        )?;

        if let Some(ref fg_color) = fill.fg_color {
            write!(xml, r#"<fgColor rgb="{}"/>"#, escape_xml(fg_color))?;
        }

        if let Some(ref bg_color) = fill.bg_color {
            write!(xml, r#"<bgColor rgb="{}"/>"#, escape_xml(bg_color))?;
        }

        xml.push_str("</patternFill></fill>");
        Ok(())
    }

    /// Write a border element to XML.
    fn write_border(&self, xml: &mut String, border: &CellBorder) -> Result<()> {
        xml.push_str("<border>");

        self.write_border_side(xml, "left", border.left.as_ref())?;
        self.write_border_side(xml, "right", border.right.as_ref())?;
        self.write_border_side(xml, "top", border.top.as_ref())?;
        self.write_border_side(xml, "bottom", border.bottom.as_ref())?;
        xml.push_str("<diagonal/>");

        xml.push_str("</border>");
        Ok(())
    }

    /// Write a single border side to XML.
    fn write_border_side(
        &self,
        xml: &mut String,
        side: &str,
        border_side: Option<&CellBorderSide>,
    ) -> Result<()> {
        if let Some(bs) = border_side {
            write!(xml, r#"<{} style="{}">"#, side, bs.style.as_str())?;

            if let Some(ref color) = bs.color {
                write!(xml, r#"<color rgb="{}"/>"#, escape_xml(color))?;
            }

            write!(xml, "</{}>", side)?;
        } else {
            write!(xml, "<{}/>", side)?;
        }

        Ok(())
    }

    /// Hash a font for deduplication.
    fn hash_font(font: &CellFont) -> u64 {
        let mut hasher = DefaultHasher::new();
        font.bold.hash(&mut hasher);
        font.italic.hash(&mut hasher);
        font.underline.hash(&mut hasher);
        font.name.hash(&mut hasher);
        font.size.map(f64::to_bits).hash(&mut hasher);
        font.color.hash(&mut hasher);
        hasher.finish()
    }

    /// Hash a fill for deduplication.
    fn hash_fill(fill: &CellFill) -> u64 {
        let mut hasher = DefaultHasher::new();
        std::mem::discriminant(&fill.pattern_type).hash(&mut hasher);
        fill.fg_color.hash(&mut hasher);
        fill.bg_color.hash(&mut hasher);
        hasher.finish()
    }

    /// Hash a border for deduplication.
    fn hash_border(border: &CellBorder) -> u64 {
        let mut hasher = DefaultHasher::new();
        Self::hash_border_side(&border.left, &mut hasher);
        Self::hash_border_side(&border.right, &mut hasher);
        Self::hash_border_side(&border.top, &mut hasher);
        Self::hash_border_side(&border.bottom, &mut hasher);
        hasher.finish()
    }

    /// Hash a border side.
    fn hash_border_side(side: &Option<CellBorderSide>, hasher: &mut impl Hasher) {
        side.is_some().hash(hasher);
        if let Some(s) = side {
            std::mem::discriminant(&s.style).hash(hasher);
            s.color.hash(hasher);
        }
    }

    fn hash_alignment(alignment: &CellAlignment, hasher: &mut impl Hasher) {
        alignment.horizontal.map(|h| h.as_str()).hash(hasher);
        alignment.vertical.map(|v| v.as_str()).hash(hasher);
        alignment.wrap_text.hash(hasher);
    }

    /// Hash a cell format for deduplication.
    fn hash_cell_format(format: &CellFormat) -> u64 {
        let mut hasher = DefaultHasher::new();
        format.font.as_ref().map(Self::hash_font).hash(&mut hasher);
        format.fill.as_ref().map(Self::hash_fill).hash(&mut hasher);
        format.border.as_ref().map(Self::hash_border).hash(&mut hasher);
        format.alignment.is_some().hash(&mut hasher);
        if let Some(ref alignment) = format.alignment {
            Self::hash_alignment(alignment, &mut hasher);
        }
        hasher.finish()
    }
}

impl Default for StylesBuilder {
    fn default() -> Self {
        Self::new(CellFont::default())
    }
}
