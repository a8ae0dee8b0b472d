use phf::phf_map;
use std::fmt;

/// CSS basic and extended keywords that show up in generated reports.
static NAMED_COLORS: phf::Map<&'static str, RGBColor> = phf_map! {
    "black" => RGBColor::new(0x00, 0x00, 0x00),
    "silver" => RGBColor::new(0xC0, 0xC0, 0xC0),
    "gray" => RGBColor::new(0x80, 0x80, 0x80),
    "grey" => RGBColor::new(0x80, 0x80, 0x80),
    "white" => RGBColor::new(0xFF, 0xFF, 0xFF),
    "maroon" => RGBColor::new(0x80, 0x00, 0x00),
    "red" => RGBColor::new(0xFF, 0x00, 0x00),
    "purple" => RGBColor::new(0x80, 0x00, 0x80),
    "fuchsia" => RGBColor::new(0xFF, 0x00, 0xFF),
    "magenta" => RGBColor::new(0xFF, 0x00, 0xFF),
    "green" => RGBColor::new(0x00, 0x80, 0x00),
    "lime" => RGBColor::new(0x00, 0xFF, 0x00),
    "olive" => RGBColor::new(0x80, 0x80, 0x00),
    "yellow" => RGBColor::new(0xFF, 0xFF, 0x00),
    "navy" => RGBColor::new(0x00, 0x00, 0x80),
    "blue" => RGBColor::new(0x00, 0x00, 0xFF),
    "teal" => RGBColor::new(0x00, 0x80, 0x80),
    "aqua" => RGBColor::new(0x00, 0xFF, 0xFF),
    "cyan" => RGBColor::new(0x00, 0xFF, 0xFF),
    "orange" => RGBColor::new(0xFF, 0xA5, 0x00),
    "lightgray" => RGBColor::new(0xD3, 0xD3, 0xD3),
    "lightgrey" => RGBColor::new(0xD3, 0xD3, 0xD3),
    "darkgray" => RGBColor::new(0xA9, 0xA9, 0xA9),
    "darkgrey" => RGBColor::new(0xA9, 0xA9, 0xA9),
    "whitesmoke" => RGBColor::new(0xF5, 0xF5, 0xF5),
    "gainsboro" => RGBColor::new(0xDC, 0xDC, 0xDC),
    "lightblue" => RGBColor::new(0xAD, 0xD8, 0xE6),
    "lightgreen" => RGBColor::new(0x90, 0xEE, 0x90),
    "lightyellow" => RGBColor::new(0xFF, 0xFF, 0xE0),
    "darkblue" => RGBColor::new(0x00, 0x00, 0x8B),
    "darkgreen" => RGBColor::new(0x00, 0x64, 0x00),
    "darkred" => RGBColor::new(0x8B, 0x00, 0x00),
    "brown" => RGBColor::new(0xA5, 0x2A, 0x2A),
    "pink" => RGBColor::new(0xFF, 0xC0, 0xCB),
    "gold" => RGBColor::new(0xFF, 0xD7, 0x00),
    "beige" => RGBColor::new(0xF5, 0xF5, 0xDC),
};

/// RGB color representation.
///
/// Represents a color using red, green, and blue components, each in the range 0-255.
///
/// # Examples
///
/// ```rust
/// use htmlgrid::common::RGBColor;
///
/// let blue = RGBColor::from_hex("0000FF").unwrap();
/// assert_eq!(blue.to_string(), "#0000FF");
///
/// let teal = RGBColor::from_css("rgb(0, 128, 128)").unwrap();
/// assert_eq!(teal.to_hex(), "008080");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RGBColor {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
}

impl RGBColor {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create an RGB color from a 3- or 6-digit hex string, with or without `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
                let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
                Some(Self::new(r * 17, g * 17, b * 17))
            },
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            },
            _ => None,
        }
    }

    /// Parse a CSS color value.
    ///
    /// Accepts hex literals, `rgb()`/`rgba()` functions (only the first three
    /// channels are read, percentages allowed) and named keywords.
    /// `transparent` and anything unrecognized yield `None`.
    pub fn from_css(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        if value.starts_with('#') {
            return Self::from_hex(value);
        }

        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba")
            .or_else(|| lower.strip_prefix("rgb"))
        {
            return Self::from_rgb_function(args);
        }

        NAMED_COLORS.get(lower.as_str()).copied()
    }

    fn from_rgb_function(args: &str) -> Option<Self> {
        let inner = args.trim_start().strip_prefix('(')?;
        let inner = inner.split(')').next()?;

        let mut channels = inner
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(Self::parse_channel);

        let r = channels.next()??;
        let g = channels.next()??;
        let b = channels.next()??;
        Some(Self::new(r, g, b))
    }

    fn parse_channel(part: &str) -> Option<u8> {
        let (value, consumed) = fast_float2::parse_partial::<f64, _>(part).ok()?;
        if consumed == 0 || !value.is_finite() {
            return None;
        }
        let scaled = if part[consumed..].starts_with('%') {
            value * 2.55
        } else {
            value
        };
        Some(scaled.round().clamp(0.0, 255.0) as u8)
    }

    /// Convert to hex string (without # prefix).
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Opaque ARGB form used by spreadsheet color attributes.
    pub fn to_argb_hex(&self) -> String {
        format!("FF{}", self.to_hex())
    }
}

impl fmt::Display for RGBColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Normalize a CSS color literal to uppercase `#RRGGBB`.
///
/// Never fails: empty, transparent and unparseable values all become `None`,
/// meaning "no color set".
///
/// # Examples
///
/// ```
/// use htmlgrid::common::normalize_color;
///
/// assert_eq!(normalize_color("#abc").as_deref(), Some("#AABBCC"));
/// assert_eq!(normalize_color("rgb(0,128,255)").as_deref(), Some("#0080FF"));
/// assert_eq!(normalize_color("rgba(255, 0, 0, 0.5)").as_deref(), Some("#FF0000"));
/// assert_eq!(normalize_color("not-a-color"), None);
/// ```
pub fn normalize_color(raw: &str) -> Option<String> {
    RGBColor::from_css(raw).map(|color| color.to_string())
}
