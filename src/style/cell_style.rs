//! Resolved presentation of one cell.

use phf::phf_map;

use super::properties::StyleProperties;
use crate::common::unit::{CssLength, CssUnit, px_to_chars};
use crate::config::ConvertOptions;
use crate::html::CellKind;

/// Border line of one cell edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BorderKind {
    #[default]
    None = 0,
    Solid = 1,
    Double = 2,
    Dashed = 3,
}

impl BorderKind {
    /// Read the line style out of a `border` shorthand such as `1px solid #000`.
    pub fn from_shorthand(value: &str) -> Self {
        let mut kind = BorderKind::None;
        let mut zero_width = false;

        for token in value.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "solid" | "groove" | "ridge" | "inset" | "outset" => kind = BorderKind::Solid,
                "double" => kind = BorderKind::Double,
                "dashed" | "dotted" => kind = BorderKind::Dashed,
                "none" | "hidden" => return BorderKind::None,
                other => {
                    if CssLength::parse(other).is_some_and(|width| width.value() == 0.0) {
                        zero_width = true;
                    }
                },
            }
        }

        if zero_width { BorderKind::None } else { kind }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == BorderKind::None
    }
}

/// Per-edge borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Borders {
    pub top: BorderKind,
    pub right: BorderKind,
    pub bottom: BorderKind,
    pub left: BorderKind,
}

impl Borders {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }

    /// Whether a left or right border is drawn.
    pub fn has_vertical_edge(&self) -> bool {
        !self.left.is_none() || !self.right.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlign {
    fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" | "-webkit-center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

impl VerticalAlign {
    fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" | "text-top" => Some(Self::Top),
            "middle" | "center" => Some(Self::Center),
            "bottom" | "text-bottom" | "baseline" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Resolved presentation attributes of a cell, also the format cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellStyle {
    pub font_name: String,
    /// Font size in hundredths of a point
    pub font_size: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// `#RRGGBB`
    pub font_color: Option<String>,
    /// `#RRGGBB`
    pub bg_color: Option<String>,
    pub borders: Borders,
    pub align: HorizontalAlign,
    pub valign: VerticalAlign,
    pub wrap: bool,
}

impl CellStyle {
    /// Style of a cell without any declarations.
    pub fn plain(options: &ConvertOptions) -> Self {
        Self {
            font_name: options.default_font_name.clone(),
            font_size: points_to_hundredths(options.default_font_size),
            bold: false,
            italic: false,
            underline: false,
            font_color: None,
            bg_color: None,
            borders: Borders::default(),
            align: HorizontalAlign::General,
            valign: VerticalAlign::Center,
            wrap: true,
        }
    }

    /// Font size in points.
    #[inline]
    pub fn font_size_pt(&self) -> f64 {
        self.font_size as f64 / 100.0
    }
}

/// Layout hints from a cell's box properties, in character units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WidthHint {
    /// Width declared by CSS or the `width` attribute
    pub explicit: Option<f64>,
    /// Left plus right padding
    pub padding: f64,
}

/// Outcome of resolving a cell's declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub style: CellStyle,
    pub width_hint: WidthHint,
    /// Whether some declaration had to be ignored
    pub degraded: bool,
}

static FONT_SIZE_KEYWORDS: phf::Map<&'static str, f64> = phf_map! {
    "xx-small" => 7.0,
    "x-small" => 7.5,
    "small" => 10.0,
    "medium" => 12.0,
    "large" => 13.5,
    "x-large" => 18.0,
    "xx-large" => 24.0,
    "xxx-large" => 36.0,
};

/// Smallest and largest font sizes a spreadsheet accepts, in points.
const FONT_SIZE_RANGE: (f64, f64) = (1.0, 409.0);

fn points_to_hundredths(points: f64) -> u32 {
    (points.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1) * 100.0).round() as u32
}

fn parse_font_size(value: &str, base_pt: f64) -> Option<f64> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if let Some(&pt) = FONT_SIZE_KEYWORDS.get(lower.as_str()) {
        return Some(pt);
    }
    match lower.as_str() {
        "smaller" => return Some(base_pt / 1.2),
        "larger" => return Some(base_pt * 1.2),
        _ => {},
    }
    CssLength::parse(value)?
        .to_pt(base_pt)
        .filter(|pt| *pt > 0.0)
}

fn parse_font_weight(value: &str) -> Option<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        numeric => atoi_simd::parse::<u32, false, false>(numeric.as_bytes())
            .ok()
            .map(|weight| weight >= 700),
    }
}

/// First concrete family of a `font-family` list.
fn parse_font_family(value: &str) -> Option<String> {
    value
        .split(',')
        .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\''))
        .find(|family| {
            !family.is_empty()
                && !matches!(
                    family.to_ascii_lowercase().as_str(),
                    "serif" | "sans-serif" | "monospace" | "cursive" | "fantasy" | "system-ui"
                )
        })
        .map(str::to_string)
}

fn length_to_chars(value: &str, font_pt: f64) -> Option<f64> {
    let length = CssLength::parse(value)?;
    length
        .to_px(font_pt * 96.0 / 72.0)
        .map(px_to_chars)
}

/// Left and right padding of `padding` plus its longhands, in characters.
fn horizontal_padding(props: &StyleProperties, font_pt: f64) -> f64 {
    let (mut left, mut right) = (0.0, 0.0);

    if let Some(ref padding) = props.padding {
        let parts: Vec<&str> = padding.split_whitespace().collect();
        let (l, r) = match parts.as_slice() {
            [all] => (*all, *all),
            [_, horizontal] | [_, horizontal, _] => (*horizontal, *horizontal),
            [_, r, _, l, ..] => (*l, *r),
            [] => ("0", "0"),
        };
        left = length_to_chars(l, font_pt).unwrap_or(0.0);
        right = length_to_chars(r, font_pt).unwrap_or(0.0);
    }
    if let Some(ref l) = props.padding_left {
        left = length_to_chars(l, font_pt).unwrap_or(left);
    }
    if let Some(ref r) = props.padding_right {
        right = length_to_chars(r, font_pt).unwrap_or(right);
    }

    left + right
}

/// Resolve a cell's declarations into a [`CellStyle`].
///
/// `color` normalizes a raw color value; the converter routes it through the
/// color cache. Declarations that cannot be read fall back to defaults and
/// mark the result as degraded; they never fail.
pub fn resolve_style(
    props: &StyleProperties,
    kind: CellKind,
    options: &ConvertOptions,
    color: impl Fn(&str) -> Option<String>,
) -> ResolvedStyle {
    let header = kind == CellKind::Header;
    let mut style = CellStyle::plain(options);
    let mut degraded = props.malformed() > 0;

    if let Some(ref family) = props.font_family {
        if let Some(name) = parse_font_family(family) {
            style.font_name = name;
        }
    }

    if let Some(ref size) = props.font_size {
        match parse_font_size(size, options.default_font_size) {
            Some(pt) => style.font_size = points_to_hundredths(pt),
            None => degraded = true,
        }
    }

    style.bold = match props.font_weight.as_deref().map(parse_font_weight) {
        Some(Some(bold)) => bold,
        Some(None) => {
            degraded = true;
            header && options.header_bold
        },
        None => header && options.header_bold,
    };

    if let Some(ref font_style) = props.font_style {
        let font_style = font_style.trim().to_ascii_lowercase();
        style.italic = font_style == "italic" || font_style.starts_with("oblique");
    }

    if let Some(ref decoration) = props.text_decoration {
        style.underline = decoration.to_ascii_lowercase().contains("underline");
    }

    if let Some(ref raw) = props.color {
        style.font_color = color(raw);
        degraded |= style.font_color.is_none() && !raw.eq_ignore_ascii_case("transparent");
    }

    if let Some(ref raw) = props.background_color {
        // `background` shorthands carry images and repeat keywords too.
        style.bg_color = color(raw).or_else(|| raw.split_whitespace().find_map(&color));
        if style.bg_color.is_none()
            && !raw.eq_ignore_ascii_case("transparent")
            && !raw.eq_ignore_ascii_case("none")
        {
            degraded = true;
        }
    } else if header {
        style.bg_color = options.header_background.as_deref().and_then(&color);
    }

    if let Some(ref border) = props.border {
        let kind = BorderKind::from_shorthand(border);
        style.borders = Borders {
            top: kind,
            right: kind,
            bottom: kind,
            left: kind,
        };
    }
    for (value, edge) in [
        (&props.border_top, &mut style.borders.top),
        (&props.border_right, &mut style.borders.right),
        (&props.border_bottom, &mut style.borders.bottom),
        (&props.border_left, &mut style.borders.left),
    ] {
        if let Some(value) = value {
            *edge = BorderKind::from_shorthand(value);
        }
    }

    style.align = match props.text_align.as_deref() {
        Some(value) => HorizontalAlign::from_css(value).unwrap_or_else(|| {
            degraded = true;
            HorizontalAlign::General
        }),
        None if header => HorizontalAlign::Center,
        None => HorizontalAlign::General,
    };

    if let Some(ref value) = props.vertical_align {
        style.valign = VerticalAlign::from_css(value).unwrap_or_default();
    }

    if let Some(ref white_space) = props.white_space {
        let white_space = white_space.trim().to_ascii_lowercase();
        style.wrap = !(white_space == "nowrap" || white_space == "pre");
    }

    let font_pt = style.font_size_pt();
    let explicit = props.width.as_deref().and_then(|width| {
        let length = CssLength::parse(width)?;
        if length.unit() == CssUnit::Percent {
            Some(options.max_column_width * length.value() / 100.0)
        } else {
            length.to_px(font_pt * 96.0 / 72.0).map(px_to_chars)
        }
    });

    ResolvedStyle {
        width_hint: WidthHint {
            explicit,
            padding: horizontal_padding(props, font_pt),
        },
        style,
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::normalize_color;

    fn resolve(raw: &str, kind: CellKind) -> ResolvedStyle {
        resolve_style(
            &StyleProperties::parse(raw),
            kind,
            &ConvertOptions::default(),
            normalize_color,
        )
    }

    #[test]
    fn test_plain_cell() {
        let resolved = resolve("", CellKind::Data);
        assert_eq!(resolved.style, CellStyle::plain(&ConvertOptions::default()));
        assert!(resolved.style.wrap);
        assert!(!resolved.degraded);
    }

    #[test]
    fn test_header_defaults_and_override() {
        let header = resolve("", CellKind::Header);
        assert!(header.style.bold);
        assert_eq!(header.style.align, HorizontalAlign::Center);

        let light = resolve("font-weight: normal; text-align: left", CellKind::Header);
        assert!(!light.style.bold);
        assert_eq!(light.style.align, HorizontalAlign::Left);
    }

    #[test]
    fn test_header_background_option() {
        let options = ConvertOptions::default().with_header_style(true, Some("#a6a6a6"));
        let resolved = resolve_style(
            &StyleProperties::default(),
            CellKind::Header,
            &options,
            normalize_color,
        );
        assert_eq!(resolved.style.bg_color.as_deref(), Some("#A6A6A6"));
    }

    #[test]
    fn test_fonts() {
        let resolved = resolve(
            "font-family: 'TH Sarabun New', sans-serif; font-size: 16px; font-weight: 800; \
             font-style: italic; text-decoration: underline",
            CellKind::Data,
        );
        assert_eq!(resolved.style.font_name, "TH Sarabun New");
        assert_eq!(resolved.style.font_size, 1200);
        assert!(resolved.style.bold);
        assert!(resolved.style.italic);
        assert!(resolved.style.underline);
    }

    #[test]
    fn test_font_size_keywords_and_relative() {
        assert_eq!(resolve("font-size: large", CellKind::Data).style.font_size, 1350);
        assert_eq!(resolve("font-size: 200%", CellKind::Data).style.font_size, 2200);
        let bad = resolve("font-size: huge", CellKind::Data);
        assert_eq!(bad.style.font_size, 1100);
        assert!(bad.degraded);
    }

    #[test]
    fn test_colors() {
        let resolved = resolve("color: #f00; background: url(x.png) #00ff00 no-repeat", CellKind::Data);
        assert_eq!(resolved.style.font_color.as_deref(), Some("#FF0000"));
        assert_eq!(resolved.style.bg_color.as_deref(), Some("#00FF00"));

        let bad = resolve("color: sparkly", CellKind::Data);
        assert_eq!(bad.style.font_color, None);
        assert!(bad.degraded);
    }

    #[test]
    fn test_borders_shorthand_then_edges() {
        let resolved = resolve(
            "border: 1px solid #000; border-bottom: 3px double; border-left: none",
            CellKind::Data,
        );
        let borders = resolved.style.borders;
        assert_eq!(borders.top, BorderKind::Solid);
        assert_eq!(borders.right, BorderKind::Solid);
        assert_eq!(borders.bottom, BorderKind::Double);
        assert_eq!(borders.left, BorderKind::None);
        assert_eq!(BorderKind::Dashed as u8, 3);
        assert_eq!(BorderKind::from_shorthand("0 solid"), BorderKind::None);
        assert_eq!(BorderKind::from_shorthand("1px dotted red"), BorderKind::Dashed);
    }

    #[test]
    fn test_alignment_and_wrap() {
        let resolved = resolve(
            "text-align: right; vertical-align: top; white-space: nowrap",
            CellKind::Data,
        );
        assert_eq!(resolved.style.align, HorizontalAlign::Right);
        assert_eq!(resolved.style.valign, VerticalAlign::Top);
        assert!(!resolved.style.wrap);
    }

    #[test]
    fn test_width_hint() {
        let resolved = resolve("width: 140px; padding: 0 7px", CellKind::Data);
        assert_eq!(resolved.width_hint.explicit, Some(20.0));
        assert_eq!(resolved.width_hint.padding, 2.0);

        let percent = resolve("width: 25%; padding-left: 14px", CellKind::Data);
        assert_eq!(percent.width_hint.explicit, Some(25.0));
        assert_eq!(percent.width_hint.padding, 2.0);

        let auto = resolve("width: auto", CellKind::Data);
        assert_eq!(auto.width_hint.explicit, None);
    }
}
