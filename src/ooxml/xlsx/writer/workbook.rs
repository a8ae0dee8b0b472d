//! Workbook-level parts and the ZIP package holding them.

use std::fmt::Write as FmtWrite;
use std::io::{Seek, Write};

use zip::write::{SimpleFileOptions, ZipWriter};

use crate::common::Result;
use crate::common::xml::escape_xml;

pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const ROOT_RELS_PATH: &str = "_rels/.rels";
pub const WORKBOOK_PATH: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
pub const STYLES_PATH: &str = "xl/styles.xml";
pub const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
pub const WORKSHEET_PATH: &str = "xl/worksheets/sheet1.xml";

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
    r#"</Relationships>"#,
);

/// Generate workbook.xml for a single worksheet named `sheet_name`.
pub fn workbook_xml(sheet_name: &str) -> Result<String> {
    let mut xml = String::with_capacity(512);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#);
    xml.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    xml.push_str(r#"<bookViews><workbookView/></bookViews>"#);

    xml.push_str("<sheets>");
    write!(
        xml,
        r#"<sheet name="{}" sheetId="1" r:id="rId1"/>"#,
        escape_xml(sheet_name)
    )?;
    xml.push_str("</sheets>");

    xml.push_str("</workbook>");
    Ok(xml)
}

/// Builder for the XLSX ZIP archive.
///
/// Parts are deflated and written in the order they are added. A part can
/// also be streamed through [`start_part`](Self::start_part).
pub struct PackageWriter<W: Write + Seek> {
    zip_writer: ZipWriter<W>,
}

impl<W: Write + Seek> PackageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip_writer: ZipWriter::new(writer),
        }
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
    }

    /// Add a complete part.
    pub fn add_part(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.zip_writer.start_file(path, Self::options())?;
        self.zip_writer.write_all(content)?;
        Ok(())
    }

    /// Open a part and return a writer for its content.
    pub fn start_part(&mut self, path: &str) -> Result<&mut ZipWriter<W>> {
        self.zip_writer.start_file(path, Self::options())?;
        Ok(&mut self.zip_writer)
    }

    /// Add the parts every single-sheet workbook carries.
    pub fn add_workbook_parts(&mut self, sheet_name: &str) -> Result<()> {
        self.add_part(CONTENT_TYPES_PATH, CONTENT_TYPES_XML.as_bytes())?;
        self.add_part(ROOT_RELS_PATH, ROOT_RELS_XML.as_bytes())?;
        self.add_part(WORKBOOK_PATH, workbook_xml(sheet_name)?.as_bytes())?;
        self.add_part(WORKBOOK_RELS_PATH, WORKBOOK_RELS_XML.as_bytes())?;
        Ok(())
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip_writer.finish()?)
    }
}
