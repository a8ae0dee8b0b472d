//! CSS length units.
//!
//! Inline table styles carry widths, paddings and font sizes in a handful of
//! CSS units. Everything is reduced to CSS pixels (96 per inch) or points
//! (72 per inch) before it reaches the layout code.

use crate::Result;
use std::fmt;
use std::str::FromStr;

/// CSS pixels per inch.
pub const PX_PER_INCH: f64 = 96.0;
/// Points per inch.
pub const PT_PER_INCH: f64 = 72.0;
/// Pixels covered by one character of the default spreadsheet font.
pub const PX_PER_CHAR: f64 = 7.0;

#[inline]
pub fn px_to_pt(px: f64) -> f64 {
    px * PT_PER_INCH / PX_PER_INCH
}

#[inline]
pub fn pt_to_px(pt: f64) -> f64 {
    pt * PX_PER_INCH / PT_PER_INCH
}

#[inline]
pub fn px_to_chars(px: f64) -> f64 {
    px / PX_PER_CHAR
}

/// Supported CSS length units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssUnit {
    /// CSS pixel (1/96 inch)
    Pixel,
    /// Point (1/72 inch)
    Point,
    /// Pica (1/6 inch)
    Pica,
    /// Inch
    Inch,
    /// Centimeter
    Centimeter,
    /// Millimeter
    Millimeter,
    /// Relative to the element font size
    Em,
    /// Relative to the root font size
    Rem,
    /// Relative to the containing length
    Percent,
}

impl CssUnit {
    /// Get the unit suffix
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Point => "pt",
            Self::Pica => "pc",
            Self::Inch => "in",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Percent => "%",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        // Unitless lengths are treated as pixels, which is what browsers do
        // for presentational attributes such as `width="120"`.
        match s {
            "" | "px" => Some(Self::Pixel),
            "pt" => Some(Self::Point),
            "pc" => Some(Self::Pica),
            "in" => Some(Self::Inch),
            "cm" => Some(Self::Centimeter),
            "mm" => Some(Self::Millimeter),
            "em" => Some(Self::Em),
            "rem" => Some(Self::Rem),
            "%" => Some(Self::Percent),
            _ => None,
        }
    }
}

impl fmt::Display for CssUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Length value with a CSS unit.
///
/// # Examples
///
/// ```
/// use htmlgrid::common::unit::{CssLength, CssUnit};
///
/// let length = CssLength::parse("12.5pt").unwrap();
/// assert_eq!(length.value(), 12.5);
/// assert_eq!(length.unit(), CssUnit::Point);
///
/// let width = CssLength::parse("140PX").unwrap();
/// assert_eq!(width.to_px(16.0), Some(140.0));
///
/// assert!(CssLength::parse("auto").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssLength {
    value: f64,
    unit: CssUnit,
}

impl CssLength {
    #[inline]
    pub fn new(value: f64, unit: CssUnit) -> Self {
        Self { value, unit }
    }

    /// Get the numeric value
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Get the unit
    #[inline]
    pub fn unit(&self) -> CssUnit {
        self.unit
    }

    /// Parse a CSS length, returning `None` for keywords, negative values
    /// and unknown units.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (value, consumed) = fast_float2::parse_partial::<f64, _>(s).ok()?;
        if consumed == 0 || !value.is_finite() || value < 0.0 {
            return None;
        }

        let suffix = s[consumed..].trim();
        let unit = if suffix.len() <= 3 {
            CssUnit::from_suffix(&suffix.to_ascii_lowercase())?
        } else {
            return None;
        };

        Some(Self::new(value, unit))
    }

    /// Resolve to CSS pixels.
    ///
    /// `font_px` is the font size used for `em`/`rem`. Percentages have no
    /// meaning without a containing length and yield `None`.
    pub fn to_px(&self, font_px: f64) -> Option<f64> {
        let px = match self.unit {
            CssUnit::Pixel => self.value,
            CssUnit::Point => pt_to_px(self.value),
            CssUnit::Pica => pt_to_px(self.value * 12.0),
            CssUnit::Inch => self.value * PX_PER_INCH,
            CssUnit::Centimeter => self.value * PX_PER_INCH / 2.54,
            CssUnit::Millimeter => self.value * PX_PER_INCH / 25.4,
            CssUnit::Em | CssUnit::Rem => self.value * font_px,
            CssUnit::Percent => return None,
        };
        Some(px)
    }

    /// Resolve to points, with percentages taken relative to `base_pt`.
    pub fn to_pt(&self, base_pt: f64) -> Option<f64> {
        match self.unit {
            CssUnit::Percent => Some(base_pt * self.value / 100.0),
            CssUnit::Em | CssUnit::Rem => Some(base_pt * self.value),
            _ => self.to_px(pt_to_px(base_pt)).map(px_to_pt),
        }
    }
}

impl FromStr for CssLength {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| crate::Error::Other(format!("Invalid CSS length '{}'", s)))
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}
