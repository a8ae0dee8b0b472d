//! Formatting records of the XLSX style table.

/// Cell format information.
#[derive(Debug, Clone, Default)]
pub struct CellFormat {
    pub font: Option<CellFont>,
    pub fill: Option<CellFill>,
    pub border: Option<CellBorder>,
    pub alignment: Option<CellAlignment>,
}

/// Font properties for a cell.
#[derive(Debug, Clone, Default)]
pub struct CellFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// ARGB hex, e.g. `FF0000FF`
    pub color: Option<String>,
}

/// Fill properties for a cell.
#[derive(Debug, Clone)]
pub struct CellFill {
    pub pattern_type: CellFillPatternType,
    pub fg_color: Option<String>,
    pub bg_color: Option<String>,
}

/// Cell fill pattern types.
#[derive(Debug, Clone, Copy)]
pub enum CellFillPatternType {
    None,
    Solid,
    Gray125,
}

impl CellFillPatternType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Solid => "solid",
            Self::Gray125 => "gray125",
        }
    }
}

/// Border properties for a cell.
#[derive(Debug, Clone, Default)]
pub struct CellBorder {
    pub left: Option<CellBorderSide>,
    pub right: Option<CellBorderSide>,
    pub top: Option<CellBorderSide>,
    pub bottom: Option<CellBorderSide>,
}

/// Border side properties.
#[derive(Debug, Clone)]
pub struct CellBorderSide {
    pub style: CellBorderLineStyle,
    pub color: Option<String>,
}

/// Border line styles.
#[derive(Debug, Clone, Copy)]
pub enum CellBorderLineStyle {
    Thin,
    Dashed,
    Double,
}

impl CellBorderLineStyle {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::Dashed => "dashed",
            Self::Double => "double",
        }
    }
}

/// Alignment and wrapping of cell text.
#[derive(Debug, Clone, Default)]
pub struct CellAlignment {
    pub horizontal: Option<CellHorizontalAlignment>,
    pub vertical: Option<CellVerticalAlignment>,
    pub wrap_text: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum CellHorizontalAlignment {
    Left,
    Center,
    Right,
    Justify,
}

impl CellHorizontalAlignment {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CellVerticalAlignment {
    Top,
    Center,
    Bottom,
}

impl CellVerticalAlignment {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}
